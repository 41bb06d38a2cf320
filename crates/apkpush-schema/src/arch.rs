//! Android ABI tags.

/// Android ABI tag, as used for the `lib/<abi>/` directories inside an APK
/// and reported by the device's `ro.product.cpu.abi` property.
///
/// The four mainstream ABIs get their own variants. Anything else the device
/// (or an archive) reports is carried through untouched as [`Abi::Other`],
/// so a new ABI still matches an archive group of the same name.
///
/// # Example
///
/// ```
/// use apkpush_schema::Abi;
///
/// let abi = Abi::parse("arm64-v8a");
/// assert_eq!(abi, Abi::Arm64V8a);
/// assert_eq!(abi.as_str(), "arm64-v8a");
///
/// let unknown = Abi::parse("riscv64");
/// assert_eq!(unknown.as_str(), "riscv64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Abi {
    /// 64-bit ARM (`arm64-v8a`)
    Arm64V8a,
    /// 32-bit ARM with hardware FP (`armeabi-v7a`)
    ArmeabiV7a,
    /// 32-bit Intel (`x86`)
    X86,
    /// 64-bit Intel (`x86_64`)
    X86_64,
    /// Any other tag, kept verbatim
    Other(String),
}

impl Abi {
    /// The ABIs with a dedicated variant.
    pub const KNOWN: [Abi; 4] = [Abi::Arm64V8a, Abi::ArmeabiV7a, Abi::X86, Abi::X86_64];

    /// Normalize a raw tag. Surrounding whitespace is ignored; unrecognized
    /// values become [`Abi::Other`] rather than an error.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "arm64-v8a" => Self::Arm64V8a,
            "armeabi-v7a" => Self::ArmeabiV7a,
            "x86" => Self::X86,
            "x86_64" => Self::X86_64,
            other => Self::Other(other.to_string()),
        }
    }

    /// Convert to the on-disk / on-device string
    pub fn as_str(&self) -> &str {
        match self {
            Self::Arm64V8a => "arm64-v8a",
            Self::ArmeabiV7a => "armeabi-v7a",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Other(s) => s,
        }
    }

    /// Whether this tag has a dedicated variant.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl std::fmt::Display for Abi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Abi {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Abi {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Abi> for String {
    fn from(abi: Abi) -> Self {
        match abi {
            Abi::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}
