use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Drive letter, then everything after the (optional) leading separators.
regex!(WINDOWS_PATH_REGEX, r"^([A-Za-z]):[\\/]*(.*)$");
