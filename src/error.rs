use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubextractError {
    #[error("Transcoder error: {0}")]
    Transcoder(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Archive extraction failed: {0}")]
    Archive(String),

    #[error("Selection does not match tracks: {selections} selections for {tracks} tracks")]
    SelectionMismatch { tracks: usize, selections: usize },

    #[error("No subtitles selected for export")]
    NothingSelected,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("No output name planned for track {0}")]
    MissingName(usize),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, SubextractError>;
