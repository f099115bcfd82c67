//! Device commands.

use anyhow::Result;
use console::style;

use oqtopus::{Device, DeviceBackend};

use super::common::Connection;

fn backend(conn: &Connection) -> Result<DeviceBackend> {
    Ok(DeviceBackend::new(&conn.load_config()?)?)
}

fn styled_status(device: &Device) -> console::StyledObject<&str> {
    if device.is_available() {
        style(device.status.as_str()).green()
    } else {
        style(device.status.as_str()).red()
    }
}

/// Execute the devices command.
pub async fn execute_list(conn: &Connection) -> Result<()> {
    let devices = backend(conn)?.get_devices().await?;

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    println!("{} {} device(s):\n", style("→").cyan().bold(), devices.len());
    println!(
        "  {:<20}  {:<10}  {:<12}  {:>6}  {:>7}",
        style("DEVICE ID").bold(),
        style("TYPE").bold(),
        style("STATUS").bold(),
        style("QUBITS").bold(),
        style("PENDING").bold()
    );
    println!("  {}", "-".repeat(64));

    for device in &devices {
        println!(
            "  {:<20}  {:<10}  {:<12}  {:>6}  {:>7}",
            device.device_id,
            device.device_type,
            styled_status(device),
            device.n_qubits.map_or_else(|| "-".into(), |n| n.to_string()),
            device
                .n_pending_jobs
                .map_or_else(|| "-".into(), |n| n.to_string()),
        );
    }

    Ok(())
}

/// Execute the device command.
pub async fn execute_show(conn: &Connection, device_id: &str) -> Result<()> {
    let device = backend(conn)?.get_device(device_id).await?;

    println!("  {:<16} {}", "Device ID:", style(&device.device_id).bold());
    println!("  {:<16} {}", "Type:", device.device_type);
    println!("  {:<16} {}", "Status:", styled_status(&device));
    if let Some(at) = device.available_at {
        println!("  {:<16} {}", "Available at:", at.to_rfc3339());
    }
    if let Some(n) = device.n_qubits {
        println!("  {:<16} {}", "Qubits:", n);
    }
    if let Some(n) = device.n_pending_jobs {
        println!("  {:<16} {}", "Pending jobs:", n);
    }
    if !device.basis_gates.is_empty() {
        println!("  {:<16} {}", "Basis gates:", device.basis_gates.join(", "));
    }
    if !device.supported_instructions.is_empty() {
        println!(
            "  {:<16} {}",
            "Instructions:",
            device.supported_instructions.join(", ")
        );
    }
    if let Some(at) = device.calibrated_at {
        println!("  {:<16} {}", "Calibrated at:", at.to_rfc3339());
    }
    if let Some(description) = &device.description {
        println!("  {:<16} {}", "Description:", description);
    }

    Ok(())
}
