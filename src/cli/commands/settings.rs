use std::net::Ipv4Addr;

use wled_sync_rs::WledError;

use crate::{Params, utils::create_service};

pub async fn show_settings(params: Params, ip: Ipv4Addr, raw: bool) -> Result<(), WledError> {
    let service = create_service(&params)?;
    if raw {
        println!("{}", service.client().settings_script(&ip.to_string()).await?);
        return Ok(());
    }

    service.store().prepare().await?;
    let fetched = service.fetch_settings(ip).await?;
    println!("{}", serde_json::to_string_pretty(&fetched.settings)?);
    println!("Saved to {}", fetched.saved_to.display());
    Ok(())
}
