use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpBinError {
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    #[error("IP.BIN buffer too small: {0} bytes")]
    BufferTooSmall(usize),
}

pub type IpBinResult<T> = Result<T, IpBinError>;
