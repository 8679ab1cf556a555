pub mod http;
pub mod identity_file;
pub mod media;

pub use http::HttpRemoteAdapter;
pub use identity_file::JsonFileStore;
pub use media::FsImageSource;
