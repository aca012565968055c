use std::time::Duration;

use wled_sync_rs::{Scanner, WledError};

use crate::{Params, utils::create_client};

pub async fn scan(params: Params, service_type: &str, seconds: u64) -> Result<(), WledError> {
    let client = create_client(&params)?;
    let devices = Scanner::scan(client, service_type, Duration::from_secs(seconds)).await?;
    if devices.is_empty() {
        println!("No devices found");
    }
    for device in devices {
        println!("{:<16} {:<12} {}", device.address, device.version, device.name);
    }
    Ok(())
}
