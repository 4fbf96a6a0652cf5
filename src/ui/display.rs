//! Styled result lines.

use std::net::SocketAddr;
use std::path::Path;

use bytesize::ByteSize;
use console::style;

use crate::config::APP_NAME;
use crate::error::TransferError;
use crate::types::Receipt;

/// Human-readable size, e.g. `1.5 KiB`.
pub fn format_bytes(bytes: u64) -> String {
    ByteSize::b(bytes).display().iec().to_string()
}

pub fn show_listening(addr: SocketAddr, output_dir: &Path) {
    println!("{} {}", style("✓").green(), style(format!("{APP_NAME} listening on {addr}")).bold());
    println!("  {} {}", style("output:").dim(), output_dir.display());
}

pub fn show_delivered(path: &Path, receipt: &Receipt) {
    println!(
        "{} {}",
        style("✓").green(),
        style(format!("Sent {} ({}), stored as {}", path.display(), format_bytes(receipt.bytes_written), receipt.stored_as)).bold()
    );
}

pub fn show_failed(path: &Path, err: &TransferError) {
    let label = if err.is_security_relevant() { style(err.kind().to_string()).red().bold() } else { style(err.kind().to_string()).yellow() };
    eprintln!("{} {} {}: {}", style("✗").red(), label, path.display(), err.detail());
}

pub fn show_stopped() {
    println!("{} {}", style("✓").green(), style("Server stopped").bold());
}
