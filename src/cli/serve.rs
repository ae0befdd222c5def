use crate::{config::Config, error, info, server};

pub async fn serve(mut config: Config, addr: Option<String>) {
    if let Some(addr) = addr {
        config.server_addr = addr;
    }

    info!("Starting predictify proxy on {}", config.server_addr);
    if let Err(e) = server::serve(config, None).await {
        error!("Server failed: {}", e);
    }
}
