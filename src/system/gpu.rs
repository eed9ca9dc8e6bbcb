//! GPU detection
//!
//! Best-effort detection of the installed GPU, used to name the accelerator in
//! status messages and to size the context window.

use std::process::Command;

/// Detected GPU
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuInfo {
    pub name: String,
    /// Dedicated (or, on Apple Silicon, unified) memory; 0 when unknown
    pub vram_total_mb: u64,
}

/// Detect the installed GPU (best effort)
pub fn detect_gpu() -> Option<GpuInfo> {
    #[cfg(target_os = "macos")]
    let found = query_system_profiler().or_else(query_apple_silicon);

    #[cfg(target_os = "windows")]
    let found = query_nvidia_smi().or_else(query_wmic);

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let found = query_nvidia_smi();

    if found.is_none() {
        tracing::debug!("No GPU detected");
    }
    found
}

/// Total GPU memory in GB, `None` when no GPU (or no size) is detected
pub fn get_total_vram_gb() -> Option<f64> {
    detect_gpu()
        .filter(|gpu| gpu.vram_total_mb > 0)
        .map(|gpu| gpu.vram_total_mb as f64 / 1024.0)
}

/// Stdout of a successful command run
fn run(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(not(target_os = "macos"))]
fn query_nvidia_smi() -> Option<GpuInfo> {
    let stdout = run(
        "nvidia-smi",
        &["--query-gpu=name,memory.total", "--format=csv,noheader,nounits"],
    )?;
    parse_nvidia_smi(&stdout)
}

/// First GPU of `name, total MiB` CSV output
#[cfg(not(target_os = "macos"))]
fn parse_nvidia_smi(stdout: &str) -> Option<GpuInfo> {
    let line = stdout.lines().find(|l| !l.trim().is_empty())?;
    let (name, total) = line.split_once(',')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(GpuInfo {
        name: name.to_string(),
        vram_total_mb: total.trim().parse().ok()?,
    })
}

#[cfg(target_os = "macos")]
fn query_system_profiler() -> Option<GpuInfo> {
    let stdout = run("system_profiler", &["SPDisplaysDataType"])?;
    let mut gpu = parse_system_profiler(&stdout)?;
    // Apple Silicon reports no VRAM line; the GPU shares system memory
    if gpu.vram_total_mb == 0 && gpu.name.contains("Apple") {
        gpu.vram_total_mb = macos_memory_mb().unwrap_or(0);
    }
    Some(gpu)
}

/// Chipset and VRAM lines of `system_profiler SPDisplaysDataType`
#[cfg(target_os = "macos")]
fn parse_system_profiler(stdout: &str) -> Option<GpuInfo> {
    let mut name = None;
    let mut vram_total_mb = 0;
    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        if key == "Chipset Model" && name.is_none() && !value.is_empty() {
            name = Some(value.to_string());
        } else if key.starts_with("VRAM") && vram_total_mb == 0 {
            // "16 GB" or "4096 MB"
            let mut parts = value.split_whitespace();
            if let (Some(amount), Some(unit)) = (parts.next(), parts.next()) {
                let amount: u64 = amount.parse().unwrap_or(0);
                vram_total_mb = if unit.eq_ignore_ascii_case("GB") {
                    amount * 1024
                } else {
                    amount
                };
            }
        }
    }
    Some(GpuInfo {
        name: format!("{} (Metal)", name?),
        vram_total_mb,
    })
}

#[cfg(target_os = "macos")]
fn query_apple_silicon() -> Option<GpuInfo> {
    let brand = run("sysctl", &["-n", "machdep.cpu.brand_string"])?;
    let brand = brand.trim();
    if !brand.contains("Apple") {
        return None;
    }
    Some(GpuInfo {
        name: format!("{} GPU (Metal)", brand),
        vram_total_mb: macos_memory_mb().unwrap_or(0),
    })
}

#[cfg(target_os = "macos")]
fn macos_memory_mb() -> Option<u64> {
    let bytes: u64 = run("sysctl", &["-n", "hw.memsize"])?.trim().parse().ok()?;
    Some(bytes / 1024 / 1024)
}

#[cfg(target_os = "windows")]
fn query_wmic() -> Option<GpuInfo> {
    let stdout = run(
        "wmic",
        &["path", "Win32_VideoController", "get", "Name,AdapterRAM", "/Format:List"],
    )?;
    parse_wmic(&stdout)
}

/// First adapter of `wmic ... /Format:List` output
#[cfg(target_os = "windows")]
fn parse_wmic(stdout: &str) -> Option<GpuInfo> {
    let mut name = None;
    let mut adapter_ram = 0u64;
    for line in stdout.lines() {
        match line.trim().split_once('=') {
            Some(("Name", value)) if name.is_none() && !value.trim().is_empty() => {
                name = Some(value.trim().to_string());
            }
            Some(("AdapterRAM", value)) if adapter_ram == 0 => {
                adapter_ram = value.trim().parse().unwrap_or(0);
            }
            _ => {}
        }
    }
    Some(GpuInfo {
        name: name?,
        vram_total_mb: adapter_ram / 1024 / 1024,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_parse_nvidia_smi() {
        let gpu = parse_nvidia_smi("NVIDIA GeForce RTX 3060, 12288\nTesla T4, 15360\n").unwrap();
        assert_eq!(
            gpu,
            GpuInfo {
                name: "NVIDIA GeForce RTX 3060".to_string(),
                vram_total_mb: 12288,
            }
        );
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_parse_nvidia_smi_rejects_garbage() {
        assert!(parse_nvidia_smi("No devices were found").is_none());
        assert!(parse_nvidia_smi("GPU, n/a").is_none());
        assert!(parse_nvidia_smi("").is_none());
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_parse_system_profiler() {
        let stdout = "Graphics/Displays:\n\n    AMD Radeon Pro 5500M:\n\n      Chipset Model: AMD Radeon Pro 5500M\n      VRAM (Total): 8 GB\n";
        let gpu = parse_system_profiler(stdout).unwrap();
        assert_eq!(gpu.name, "AMD Radeon Pro 5500M (Metal)");
        assert_eq!(gpu.vram_total_mb, 8192);
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_parse_wmic() {
        let stdout = "\r\n\r\nAdapterRAM=4293918720\r\nName=NVIDIA GeForce GTX 1650\r\n\r\n";
        let gpu = parse_wmic(stdout).unwrap();
        assert_eq!(gpu.name, "NVIDIA GeForce GTX 1650");
        assert_eq!(gpu.vram_total_mb, 4095);
    }

    #[test]
    fn test_vram_gb_requires_detected_size() {
        match detect_gpu() {
            Some(gpu) if gpu.vram_total_mb > 0 => assert!(get_total_vram_gb().is_some()),
            _ => assert!(get_total_vram_gb().is_none()),
        }
    }
}
