//! GPU compute context: adapter, device, queue and compiled kernels.
//!
//! A context is built once and shared by reference with every filter call.
//! Construction enumerates the adapters of the selected backends, keeps the
//! GPU-class ones (discrete, integrated, virtual), picks one by index, opens
//! a device and compiles every kernel. Shader validation errors are caught
//! in an error scope and surface as [`GpuError::ShaderCompilation`].

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use pfx_core::{config, Image, Pixel};
use tracing::{debug, info, trace};
use wgpu::util::DeviceExt;

use crate::shaders::{self, WORKGROUP_SIZE};
use crate::{GpuError, GpuResult};

/// Dimensions uniform: [width, height, pixel count, 0]
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

/// Context construction options.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    /// Index into the list of GPU adapters.
    pub adapter: usize,
    /// Backends to enumerate.
    pub backends: wgpu::Backends,
}

impl Default for ContextOptions {
    /// Adapter from `PFX_GPU_ADAPTER`, backends from `PFX_GPU_BACKEND`.
    fn default() -> Self {
        Self {
            adapter: config::gpu_adapter(),
            backends: parse_backends(config::gpu_backend().as_deref()),
        }
    }
}

impl ContextOptions {
    /// Selects the adapter at `index`.
    pub fn with_adapter(mut self, index: usize) -> Self {
        self.adapter = index;
        self
    }
}

/// Maps a backend name to wgpu backend flags; unknown or missing means all.
pub fn parse_backends(name: Option<&str>) -> wgpu::Backends {
    match name.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("vulkan" | "vk") => wgpu::Backends::VULKAN,
        Some("metal") => wgpu::Backends::METAL,
        Some("dx12" | "d3d12") => wgpu::Backends::DX12,
        Some("gl" | "opengl" | "gles") => wgpu::Backends::GL,
        _ => wgpu::Backends::all(),
    }
}

fn is_gpu(info: &wgpu::AdapterInfo) -> bool {
    matches!(
        info.device_type,
        wgpu::DeviceType::DiscreteGpu | wgpu::DeviceType::IntegratedGpu | wgpu::DeviceType::VirtualGpu
    )
}

fn gpu_adapters(backends: wgpu::Backends) -> (usize, Vec<wgpu::Adapter>) {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    });
    let all = instance.enumerate_adapters(backends);
    let total = all.len();
    let gpus = all.into_iter().filter(|a| is_gpu(&a.get_info())).collect();
    (total, gpus)
}

/// GPU adapters available with the default options, in selection order.
pub fn adapters() -> Vec<wgpu::AdapterInfo> {
    let (_, gpus) = gpu_adapters(ContextOptions::default().backends);
    gpus.iter().map(|a| a.get_info()).collect()
}

/// Adapter, device, queue and the kernel pipeline cache.
pub struct ComputeContext {
    info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipelines: HashMap<&'static str, wgpu::ComputePipeline>,
    max_groups: u32,
    chunk_pixels: usize,
}

impl std::fmt::Debug for ComputeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeContext")
            .field("adapter", &self.info.name)
            .field("backend", &self.info.backend)
            .field("kernels", &self.pipelines.len())
            .field("chunk_pixels", &self.chunk_pixels)
            .finish()
    }
}

impl ComputeContext {
    /// Creates a context with [`ContextOptions::default`].
    pub fn new() -> GpuResult<Self> {
        Self::with_options(ContextOptions::default())
    }

    /// Creates a context with explicit options.
    pub fn with_options(options: ContextOptions) -> GpuResult<Self> {
        pollster::block_on(Self::new_async(options))
    }

    async fn new_async(options: ContextOptions) -> GpuResult<Self> {
        let (total, gpus) = gpu_adapters(options.backends);
        if total == 0 {
            return Err(GpuError::NoAdapter);
        }
        let available = gpus.len();
        let adapter = gpus.into_iter().nth(options.adapter).ok_or(GpuError::NoDevice {
            index: options.adapter,
            available,
        })?;
        let info = adapter.get_info();
        info!(adapter = %info.name, backend = ?info.backend, kind = ?info.device_type, "selected GPU adapter");

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("pfx_gpu_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        let pipelines = Self::build_pipelines(&device).await?;

        let max_groups = adapter_limits.max_compute_workgroups_per_dimension.max(1);
        let chunk_pixels = chunk_pixels(
            u64::from(adapter_limits.max_storage_buffer_binding_size),
            adapter_limits.max_buffer_size,
            max_groups,
        );
        debug!(chunk_pixels, "dispatch chunk size");

        Ok(Self {
            info,
            device,
            queue,
            pipelines,
            max_groups,
            chunk_pixels,
        })
    }

    async fn build_pipelines(
        device: &wgpu::Device,
    ) -> GpuResult<HashMap<&'static str, wgpu::ComputePipeline>> {
        let mut pipelines = HashMap::new();
        for &(name, body) in shaders::KERNELS {
            debug!(kernel = name, "compiling kernel");
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(shaders::module_source(body).into()),
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(name),
                layout: None,
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });
            if let Some(err) = device.pop_error_scope().await {
                return Err(GpuError::ShaderCompilation(format!("{name}: {err}")));
            }
            pipelines.insert(name, pipeline);
        }
        Ok(pipelines)
    }

    /// Information about the selected adapter.
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.info
    }

    /// Returns `true` if a kernel named `name` was compiled.
    pub fn has_kernel(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    fn kernel(&self, name: &str) -> GpuResult<&wgpu::ComputePipeline> {
        self.pipelines
            .get(name)
            .ok_or_else(|| GpuError::UnknownKernel(name.to_string()))
    }

    /// Runs kernel `name` over every pixel of `img` in place.
    ///
    /// `params` is bound as a uniform at binding 2 when present. Images larger
    /// than one storage binding are processed in consecutive chunks. Blocks
    /// until the result has been copied back into `img`.
    pub(crate) fn run(&self, name: &str, img: &mut Image, params: Option<&[u8]>) -> GpuResult<()> {
        let pipeline = self.kernel(name)?;
        if img.is_empty() {
            return Ok(());
        }
        trace!(kernel = name, width = img.width(), height = img.height(), "gpu dispatch");

        let params = params.map(|bytes| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("params_uniform"),
                contents: bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            })
        });
        let (width, height) = img.dimensions();
        for chunk in img.pixels_mut().chunks_mut(self.chunk_pixels) {
            self.run_chunk(name, pipeline, chunk, [width, height], params.as_ref())?;
        }
        Ok(())
    }

    fn run_chunk(
        &self,
        name: &str,
        pipeline: &wgpu::ComputePipeline,
        chunk: &mut [Pixel],
        extent: [u32; 2],
        params: Option<&wgpu::Buffer>,
    ) -> GpuResult<()> {
        // chunk_pixels never exceeds u32::MAX
        let count = chunk.len() as u32;

        // Stage
        let pixels = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pixels"),
            contents: bytemuck::cast_slice(chunk),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });
        let dims = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dims_uniform"),
            contents: bytemuck::bytes_of(&DimsUniform {
                dims: [extent[0], extent[1], count, 0],
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        // Bind
        let mut entries = vec![
            wgpu::BindGroupEntry { binding: 0, resource: pixels.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: dims.as_entire_binding() },
        ];
        if let Some(params) = params {
            entries.push(wgpu::BindGroupEntry { binding: 2, resource: params.as_entire_binding() });
        }
        let layout = pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout: &layout,
            entries: &entries,
        });

        // Dispatch
        let groups = dispatch_grid(count, self.max_groups);
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("compute_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups.0, groups.1, 1);
        }

        // Fetch
        let size = (chunk.len() * PIXEL_BYTES) as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_buffer_to_buffer(&pixels, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| GpuError::BufferMap("map channel closed".into()))?
            .map_err(|e| GpuError::BufferMap(e.to_string()))?;

        let data = slice.get_mapped_range();
        bytemuck::cast_slice_mut::<Pixel, u8>(chunk).copy_from_slice(&data);
        drop(data);
        staging.unmap();
        Ok(())
    }
}

const PIXEL_BYTES: usize = std::mem::size_of::<Pixel>();

/// Pixels per dispatch: the pixel buffer has to fit one storage binding and
/// one buffer, and its work-group grid has to fit `max_groups` squared.
pub(crate) fn chunk_pixels(max_binding: u64, max_buffer: u64, max_groups: u32) -> usize {
    let by_bytes = max_binding.min(max_buffer) / PIXEL_BYTES as u64;
    let by_grid = u64::from(max_groups) * u64::from(max_groups) * u64::from(WORKGROUP_SIZE);
    let pixels = by_bytes.min(by_grid).min(u64::from(u32::MAX)).max(1);
    usize::try_from(pixels).unwrap_or(usize::MAX)
}

/// Work-group grid for `count` pixels: `ceil(count / 128)` groups, folded
/// into rows of at most `max_per_dim` groups.
pub(crate) fn dispatch_grid(count: u32, max_per_dim: u32) -> (u32, u32) {
    let groups = count.div_ceil(WORKGROUP_SIZE);
    if groups <= max_per_dim {
        (groups, 1)
    } else {
        (max_per_dim, groups.div_ceil(max_per_dim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_grid() {
        assert_eq!(dispatch_grid(1, 65535), (1, 1));
        assert_eq!(dispatch_grid(128, 65535), (1, 1));
        assert_eq!(dispatch_grid(129, 65535), (2, 1));
        assert_eq!(dispatch_grid(1920 * 1080, 65535), (16200, 1));
        // 8192x8192 needs 524288 groups
        assert_eq!(dispatch_grid(8192 * 8192, 65535), (65535, 9));
    }

    #[test]
    fn test_grid_covers_all_pixels() {
        for count in [1u32, 127, 128, 1000, 9_000_000] {
            let (x, y) = dispatch_grid(count, 1000);
            assert!(x as u64 * y as u64 * WORKGROUP_SIZE as u64 >= count as u64);
            assert!(x <= 1000);
        }
    }

    #[test]
    fn test_chunk_pixels_respects_limits() {
        const MIB: u64 = 1 << 20;
        // 128 MiB binding, 256 MiB buffer: 32 Mi pixels per dispatch
        let chunk = chunk_pixels(128 * MIB, 256 * MIB, 65535);
        assert_eq!(chunk, 32 * 1024 * 1024);
        // an 8192x8192 image (256 MiB) goes out in two dispatches
        assert_eq!((8192usize * 8192).div_ceil(chunk), 2);

        // max_buffer_size can be the tighter one
        assert_eq!(chunk_pixels(128 * MIB, 64 * MIB, 65535), 16 * 1024 * 1024);
        // so can the grid
        assert_eq!(chunk_pixels(u64::MAX, u64::MAX, 16), 16 * 16 * 128);
        // never zero
        assert_eq!(chunk_pixels(3, 3, 65535), 1);
    }

    #[test]
    fn test_chunk_grid_fits_device() {
        for (binding, groups) in [(128u64 << 20, 65535u32), (u32::MAX as u64, 65535), (1 << 30, 4096)] {
            let chunk = chunk_pixels(binding, u64::MAX, groups);
            let (x, y) = dispatch_grid(chunk as u32, groups);
            assert!(x <= groups && y <= groups);
            assert!(chunk as u64 * PIXEL_BYTES as u64 <= binding);
        }
    }

    #[test]
    fn test_parse_backends() {
        assert_eq!(parse_backends(Some("vulkan")), wgpu::Backends::VULKAN);
        assert_eq!(parse_backends(Some(" Metal ")), wgpu::Backends::METAL);
        assert_eq!(parse_backends(Some("gl")), wgpu::Backends::GL);
        assert_eq!(parse_backends(Some("nonsense")), wgpu::Backends::all());
        assert_eq!(parse_backends(None), wgpu::Backends::all());
    }

    #[test]
    fn test_options_builder() {
        let opts = ContextOptions::default().with_adapter(3);
        assert_eq!(opts.adapter, 3);
    }
}
