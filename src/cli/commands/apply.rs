use std::net::Ipv4Addr;

use wled_sync_rs::{WledError, sync::encode};

use crate::{Params, utils::create_service};

pub async fn apply_preset(
    params: Params,
    ip: Ipv4Addr,
    preset: &str,
    dry_run: bool,
) -> Result<(), WledError> {
    let service = create_service(&params)?;
    if dry_run {
        let settings = service.store().load_preset(preset).await?;
        println!("{}", encode(&settings));
        return Ok(());
    }

    match service.apply_preset(ip, preset).await {
        Ok(outcome) => println!("{}", outcome.message()),
        Err(e) => {
            println!("Failed to apply {preset} to {ip}: {e}");
            return Err(e);
        }
    }
    Ok(())
}
