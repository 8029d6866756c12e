use thiserror::Error;

#[derive(Debug, Error)]
pub enum BonjourError {
    #[error("mDNS discovery error: {0}")]
    Mdns(#[from] mdns::Error),
}
