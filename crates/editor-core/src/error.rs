use thiserror::Error;

/// Failure to dispatch a formatting command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Command `{command}` needs an argument ({expected})")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("Invalid argument for `{command}`: {value}")]
    InvalidArgument { command: &'static str, value: String },
    #[error("The editor surface rejected `{command}`: {source}")]
    Surface {
        command: &'static str,
        #[source]
        source: SurfaceError,
    },
}

/// Validation failure of an insertion builder.
///
/// `Display` is the message shown to the author.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("Please enter a URL.")]
    MissingUrl,
    #[error("Please replace the placeholder with a real URL.")]
    PlaceholderUrl,
    #[error("Image width `{0}` is not a valid size (use e.g. 480px or 75%).")]
    InvalidImageWidth(String),
    #[error("Tables need between 1 and {max} rows and columns (got {rows}x{cols}).")]
    InvalidTableSize { rows: usize, cols: usize, max: usize },
    #[error("Could not recognise a video URL or embed code.")]
    InvalidEmbedSource,
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("The editor surface rejected the insertion: {0}")]
    Surface(#[from] SurfaceError),
}

impl InsertError {
    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            InsertError::MissingUrl => "missing-url",
            InsertError::PlaceholderUrl => "placeholder-url",
            InsertError::InvalidImageWidth(_) => "invalid-image-width",
            InsertError::InvalidTableSize { .. } => "invalid-table-size",
            InsertError::InvalidEmbedSource => "invalid-embed-source",
            InsertError::Command(_) => "command",
            InsertError::Surface(_) => "surface",
        }
    }
}

/// Failure anywhere along the image upload path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Only image files can be uploaded (got `{mime_type}`).")]
    UnsupportedType { mime_type: String },
    #[error("Image is too large ({size} bytes, limit is {max} bytes).")]
    TooLarge { size: u64, max: u64 },
    #[error("An upload is already in progress for this image.")]
    InFlight,
    #[error("The editor is disabled.")]
    Disabled,
    #[error("Upload failed: {0}")]
    Transport(String),
    #[error("Upload rejected: {0}")]
    Rejected(String),
    #[error("Upload response did not contain an image URL.")]
    MissingUrl,
    #[error("Upload result discarded because the editor is no longer accepting edits.")]
    Discarded,
    #[error(transparent)]
    Insert(#[from] InsertError),
}

/// The surface could not answer a format query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The surface refused to apply a primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SurfaceError {
    message: String,
}

impl SurfaceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
