use std::env;
use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::Proxy;

use crate::error::{AuthError, AuthResult};

pub fn get_proxied_client_builder(timeout: Duration) -> AuthResult<ClientBuilder> {
    let mut cb = ClientBuilder::new().timeout(timeout);

    trace!("get_proxied_client_builder.http_proxy.before_check");
    if let Ok(http_proxy) = env::var("http_proxy") {
        let proxy = Proxy::http(&http_proxy)
            .map_err(|e| AuthError::Config(format!("invalid http_proxy {}: {}", http_proxy, e)))?;
        cb = cb.proxy(proxy);
    }

    trace!("get_proxied_client_builder.https_proxy.before_check");
    if let Ok(https_proxy) = env::var("https_proxy") {
        let proxy = Proxy::https(&https_proxy)
            .map_err(|e| AuthError::Config(format!("invalid https_proxy {}: {}", https_proxy, e)))?;
        cb = cb.proxy(proxy);
    }

    trace!("get_proxied_client_builder.done");
    Ok(cb)
}

pub fn build_client(timeout: Duration) -> AuthResult<Client> {
    get_proxied_client_builder(timeout)?
        .build()
        .map_err(|e| AuthError::Config(format!("could not create HTTP client: {}", e)))
}
