use wled_sync_rs::WledError;

use crate::{Params, utils::create_service};

pub async fn list_presets(params: Params) -> Result<(), WledError> {
    let service = create_service(&params)?;
    for preset in service.store().list_presets().await? {
        println!("{preset}");
    }
    Ok(())
}
