use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Steam names every manifest after the app it describes.
regex!(MANIFEST_FILE_REGEX, r"^appmanifest_(\d+)\.acf$");
regex!(APP_ID_REGEX, r"^\d+$");
