//! Report header and environment snapshot.
//!
//! Both blocks are written once when a session starts, before any entry.

use crate::config::{HostContext, LoggerConfig};
use chrono::{DateTime, Local};
use std::fmt::Write;
use sysinfo::System;

/// Machine description gathered at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSpecs {
    pub device: String,
    pub cpu_vendor: String,
    pub cpu_brand: String,
    pub cpu_cores: usize,
    pub cpu_speed_mhz: u64,
    pub memory_mb: u64,
    pub os: String,
    pub arch: &'static str,
    pub process_bits: u32,
}

impl SystemSpecs {
    pub fn collect() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_all();

        let cpus = system.cpus();
        let first = cpus.first();

        Self {
            device: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
            cpu_vendor: first
                .map(|cpu| cpu.vendor_id().to_string())
                .unwrap_or_default(),
            cpu_brand: first.map(|cpu| cpu.brand().trim().to_string()).unwrap_or_default(),
            cpu_cores: cpus.len(),
            cpu_speed_mhz: first.map(|cpu| cpu.frequency()).unwrap_or(0),
            memory_mb: system.total_memory() / (1024 * 1024),
            os: System::long_os_version()
                .or_else(System::name)
                .unwrap_or_else(|| std::env::consts::OS.to_string()),
            arch: std::env::consts::ARCH,
            process_bits: usize::BITS,
        }
    }
}

/// `# Debug Log file` block with product, version and creation time.
pub fn header(config: &LoggerConfig, created: DateTime<Local>) -> String {
    let mut out = String::with_capacity(160);
    out.push_str("# Debug Log file\n\n");
    let _ = writeln!(out, "Product: **{}**  ", config.product_label());
    let _ = writeln!(out, "Version: **{}**  ", config.product_version);
    let _ = writeln!(
        out,
        "Time created: **{}**  \n",
        created.format("%d.%B %Y - %H:%M:%S")
    );
    out
}

/// `## System specification` block.
pub fn system_specs(specs: &SystemSpecs, host: &HostContext) -> String {
    let mut out = String::with_capacity(512);
    out.push_str("## System specification\n\n");
    let _ = writeln!(out, "Device: **{}**  ", specs.device);
    let _ = writeln!(out, "CPU vendor: **{}**  ", specs.cpu_vendor);
    if !specs.cpu_brand.is_empty() {
        let _ = writeln!(out, "CPU model: **{}**  ", specs.cpu_brand);
    }
    let _ = writeln!(out, "CPU cores: **{}**  ", specs.cpu_cores);
    let _ = writeln!(out, "CPU speed: **{}**  ", specs.cpu_speed_mhz);
    let _ = writeln!(out, "Memory size: **{}**  ", specs.memory_mb);
    let _ = writeln!(out, "OS: **{} ({})**  ", specs.os, specs.arch);

    match host {
        HostContext::Standalone => {
            out.push_str("Host: **Standalone**  \n");
        }
        HostContext::Plugin { format, host, path } => {
            let _ = writeln!(out, "Plugin Format: **{}**  ", format);
            let _ = writeln!(out, "Host: **{}**  ", host);
            if let Some(path) = path {
                let _ = writeln!(out, "Host Path: **{}**  ", path.display());
            }
        }
    }

    let _ = writeln!(
        out,
        "Process bit architecture: **{} bit**  \n",
        specs.process_bits
    );
    out
}
