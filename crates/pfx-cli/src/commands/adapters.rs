//! Adapters command

use anyhow::Result;

pub fn run() -> Result<()> {
    let adapters = pfx_gpu::adapters();
    if adapters.is_empty() {
        println!("No GPU adapters found");
        return Ok(());
    }
    for (i, info) in adapters.iter().enumerate() {
        println!("[{i}] {} ({:?}, {:?})", info.name, info.backend, info.device_type);
    }
    Ok(())
}
