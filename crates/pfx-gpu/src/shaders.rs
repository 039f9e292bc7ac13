//! WGSL compute kernels.
//!
//! Pixels are bound as `array<u32>`, one RGBA8 pixel per element with red in
//! the low byte. Every kernel runs in place over `dims.z` pixels using
//! work-groups of [`WORKGROUP_SIZE`]; large dispatches fold into a 2-D grid,
//! so the linear index is rebuilt from `num_workgroups`.

/// Work-group size shared by every kernel.
pub const WORKGROUP_SIZE: u32 = 128;

/// Names and sources of the kernels compiled at context creation.
pub const KERNELS: &[(&str, &str)] = &[
    (APPLY_MAT, APPLY_MAT_SRC),
    (RGB2HSV, RGB2HSV_SRC),
    (HSV2RGB, HSV2RGB_SRC),
    (RGB2YCBCR, RGB2YCBCR_SRC),
];

/// Affine colour matrix kernel name.
pub const APPLY_MAT: &str = "apply_mat";
/// RGB → HSV kernel name.
pub const RGB2HSV: &str = "rgb2hsv";
/// HSV → RGB kernel name.
pub const HSV2RGB: &str = "hsv2rgb";
/// RGB → YCbCr kernel name (forward matrix plus round-trip nudge).
pub const RGB2YCBCR: &str = "rgb2ycbcr";

const COMMON: &str = r#"
@group(0) @binding(0) var<storage, read_write> pixels: array<u32>;
@group(0) @binding(1) var<uniform> dims: vec4<u32>;  // w, h, count, 0

fn pixel_index(gid: vec3<u32>, groups: vec3<u32>) -> u32 {
    return gid.y * groups.x * 128u + gid.x;
}

fn unpack(p: u32) -> vec4<f32> {
    return vec4<f32>(
        f32(p & 0xffu),
        f32((p >> 8u) & 0xffu),
        f32((p >> 16u) & 0xffu),
        f32(p >> 24u),
    );
}

fn to_byte(x: f32) -> u32 {
    return u32(floor(clamp(x, 0.0, 255.0) + 0.5));
}

fn pack(r: u32, g: u32, b: u32, p: u32) -> u32 {
    return r | (g << 8u) | (b << 16u) | (p & 0xff000000u);
}
"#;

const APPLY_MAT_SRC: &str = r#"
struct ColorMat {
    r0: vec4<f32>,
    r1: vec4<f32>,
    r2: vec4<f32>,
    offset: vec4<f32>,
}

@group(0) @binding(2) var<uniform> mat: ColorMat;

@compute @workgroup_size(128)
fn main(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let i = pixel_index(gid, groups);
    if i >= dims.z { return; }

    let p = pixels[i];
    let c = unpack(p).xyz;
    pixels[i] = pack(
        to_byte(dot(mat.r0.xyz, c) + mat.offset.x),
        to_byte(dot(mat.r1.xyz, c) + mat.offset.y),
        to_byte(dot(mat.r2.xyz, c) + mat.offset.z),
        p,
    );
}
"#;

const RGB2HSV_SRC: &str = r#"
@compute @workgroup_size(128)
fn main(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let i = pixel_index(gid, groups);
    if i >= dims.z { return; }

    let p = pixels[i];
    let c = unpack(p).xyz / 255.0;
    let mx = max(max(c.x, c.y), c.z);
    let mn = min(min(c.x, c.y), c.z);
    let delta = mx - mn;

    var hue = 0.0;
    var sat = 0.0;
    if delta > 1.1920929e-7 {
        var sector: f32;
        if mx == c.x {
            sector = (c.y - c.z) / delta;
            sector = sector - 6.0 * floor(sector / 6.0);
        } else if mx == c.y {
            sector = (c.z - c.x) / delta + 2.0;
        } else {
            sector = (c.x - c.y) / delta + 4.0;
        }
        hue = sector * 60.0;
        sat = delta / mx;
    }

    let h = u32(floor(hue / 2.0 + 0.5)) % 180u;
    pixels[i] = pack(h, to_byte(sat * 100.0), to_byte(mx * 100.0), p);
}
"#;

const HSV2RGB_SRC: &str = r#"
@compute @workgroup_size(128)
fn main(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let i = pixel_index(gid, groups);
    if i >= dims.z { return; }

    let p = pixels[i];
    let hsv = unpack(p);
    let hue = (hsv.x * 2.0) % 360.0;
    let sat = min(hsv.y, 100.0) / 100.0;
    let val = min(hsv.z, 100.0) / 100.0;

    let c = val * sat;
    let h = hue / 60.0;
    let x = c * (1.0 - abs(h % 2.0 - 1.0));
    let m = val - c;

    var rgb: vec3<f32>;
    switch u32(h) {
        case 0u: { rgb = vec3<f32>(c, x, 0.0); }
        case 1u: { rgb = vec3<f32>(x, c, 0.0); }
        case 2u: { rgb = vec3<f32>(0.0, c, x); }
        case 3u: { rgb = vec3<f32>(0.0, x, c); }
        case 4u: { rgb = vec3<f32>(x, 0.0, c); }
        default: { rgb = vec3<f32>(c, 0.0, x); }
    }
    rgb = (rgb + m) * 255.0;
    pixels[i] = pack(to_byte(rgb.x), to_byte(rgb.y), to_byte(rgb.z), p);
}
"#;

// Same search as `pfx_ops::colorspace::rgb_to_ycbcr_pixel`: keep the rounded
// triple unless its decode misses by more than 1, then take the first ±1
// neighbour with a smaller error, stopping once one is within 1.
const RGB2YCBCR_SRC: &str = r#"
struct ColorMat {
    r0: vec4<f32>,
    r1: vec4<f32>,
    r2: vec4<f32>,
    offset: vec4<f32>,
}

struct YccMats {
    forward: ColorMat,
    inverse: ColorMat,
}

@group(0) @binding(2) var<uniform> mats: YccMats;

fn apply(m: ColorMat, c: vec3<f32>) -> vec3<i32> {
    return vec3<i32>(
        i32(to_byte(dot(m.r0.xyz, c) + m.offset.x)),
        i32(to_byte(dot(m.r1.xyz, c) + m.offset.y)),
        i32(to_byte(dot(m.r2.xyz, c) + m.offset.z)),
    );
}

fn round_trip_error(src: vec3<i32>, enc: vec3<i32>) -> i32 {
    let d = abs(apply(mats.inverse, vec3<f32>(enc)) - src);
    return max(max(d.x, d.y), d.z);
}

@compute @workgroup_size(128)
fn main(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let i = pixel_index(gid, groups);
    if i >= dims.z { return; }

    let p = pixels[i];
    let src = vec3<i32>(unpack(p).xyz);
    let enc = apply(mats.forward, vec3<f32>(src));

    var best = enc;
    var best_err = round_trip_error(src, enc);
    for (var d0 = -1; d0 <= 1; d0++) {
        for (var d1 = -1; d1 <= 1; d1++) {
            for (var d2 = -1; d2 <= 1; d2++) {
                if best_err <= 1 { break; }
                let q = enc + vec3<i32>(d0, d1, d2);
                if any(q < vec3<i32>(0)) || any(q > vec3<i32>(255)) { continue; }
                let e = round_trip_error(src, q);
                if e < best_err {
                    best_err = e;
                    best = q;
                }
            }
        }
    }

    pixels[i] = pack(u32(best.x), u32(best.y), u32(best.z), p);
}
"#;

/// Full WGSL module for a kernel body.
pub fn module_source(body: &str) -> String {
    format!("{COMMON}\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_table() {
        let names: Vec<_> = KERNELS.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["apply_mat", "rgb2hsv", "hsv2rgb", "rgb2ycbcr"]);
    }

    #[test]
    fn test_workgroup_size_matches_sources() {
        let attr = format!("@workgroup_size({WORKGROUP_SIZE})");
        for (_, body) in KERNELS {
            let src = module_source(body);
            assert!(src.contains(&attr));
            assert!(src.contains(&format!("{WORKGROUP_SIZE}u + gid.x")));
            assert!(src.contains("fn main("));
        }
    }
}
