//! Import categorization.
//!
//! Each import statement is assigned to one of five categories; rendered
//! blocks keep the categories in this order, separated by a blank line.

/// Category of an import, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportCategory {
    /// `from __future__ import ...`
    Future,
    /// Python standard library
    StdLib,
    /// Anything not otherwise classified
    ThirdParty,
    /// Modules named in the `first_party` configuration
    FirstParty,
    /// Relative imports (`from . import x`, `from ..pkg import y`)
    Relative,
}

impl ImportCategory {
    /// All categories in output order.
    pub const ORDERED: [ImportCategory; 5] = [
        ImportCategory::Future,
        ImportCategory::StdLib,
        ImportCategory::ThirdParty,
        ImportCategory::FirstParty,
        ImportCategory::Relative,
    ];
}

/// Classify a dotted module path.
///
/// `first_party` takes precedence over the standard-library table so a local
/// package shadowing a stdlib name sorts with the project's own modules.
#[must_use]
pub fn classify(module: &str, first_party: &[String]) -> ImportCategory {
    if module.starts_with('.') {
        return ImportCategory::Relative;
    }
    let root = module.split('.').next().unwrap_or(module);
    if root == "__future__" {
        return ImportCategory::Future;
    }
    if first_party.iter().any(|m| m == root) {
        return ImportCategory::FirstParty;
    }
    if is_stdlib(root) {
        return ImportCategory::StdLib;
    }
    ImportCategory::ThirdParty
}

/// Check whether a top-level module name belongs to the standard library.
#[must_use]
pub fn is_stdlib(root: &str) -> bool {
    STDLIB_MODULES
        .binary_search(&root.to_ascii_lowercase().as_str())
        .is_ok()
}

/// Top-level standard-library module names, lowercased, sorted for binary
/// search. Compiled from `sys.stdlib_module_names` across Python 3.8-3.12.
static STDLIB_MODULES: &[&str] = &[
    "__future__",
    "_thread",
    "abc",
    "aifc",
    "argparse",
    "array",
    "ast",
    "asynchat",
    "asyncio",
    "asyncore",
    "atexit",
    "audioop",
    "base64",
    "bdb",
    "binascii",
    "bisect",
    "builtins",
    "bz2",
    "calendar",
    "cgi",
    "cgitb",
    "chunk",
    "cmath",
    "cmd",
    "code",
    "codecs",
    "codeop",
    "collections",
    "colorsys",
    "compileall",
    "concurrent",
    "configparser",
    "contextlib",
    "contextvars",
    "copy",
    "copyreg",
    "cprofile",
    "crypt",
    "csv",
    "ctypes",
    "curses",
    "dataclasses",
    "datetime",
    "dbm",
    "decimal",
    "difflib",
    "dis",
    "doctest",
    "email",
    "encodings",
    "ensurepip",
    "enum",
    "errno",
    "faulthandler",
    "fcntl",
    "filecmp",
    "fileinput",
    "fnmatch",
    "fractions",
    "ftplib",
    "functools",
    "gc",
    "getopt",
    "getpass",
    "gettext",
    "glob",
    "graphlib",
    "grp",
    "gzip",
    "hashlib",
    "heapq",
    "hmac",
    "html",
    "http",
    "idlelib",
    "imaplib",
    "imghdr",
    "imp",
    "importlib",
    "inspect",
    "io",
    "ipaddress",
    "itertools",
    "json",
    "keyword",
    "lib2to3",
    "linecache",
    "locale",
    "logging",
    "lzma",
    "mailbox",
    "mailcap",
    "marshal",
    "math",
    "mimetypes",
    "mmap",
    "modulefinder",
    "msilib",
    "msvcrt",
    "multiprocessing",
    "netrc",
    "nis",
    "nntplib",
    "ntpath",
    "numbers",
    "operator",
    "optparse",
    "os",
    "ossaudiodev",
    "pathlib",
    "pdb",
    "pickle",
    "pickletools",
    "pipes",
    "pkgutil",
    "platform",
    "plistlib",
    "poplib",
    "posix",
    "posixpath",
    "pprint",
    "profile",
    "pstats",
    "pty",
    "pwd",
    "py_compile",
    "pyclbr",
    "pydoc",
    "queue",
    "quopri",
    "random",
    "re",
    "readline",
    "reprlib",
    "resource",
    "rlcompleter",
    "runpy",
    "sched",
    "secrets",
    "select",
    "selectors",
    "shelve",
    "shlex",
    "shutil",
    "signal",
    "site",
    "smtplib",
    "sndhdr",
    "socket",
    "socketserver",
    "spwd",
    "sqlite3",
    "ssl",
    "stat",
    "statistics",
    "string",
    "stringprep",
    "struct",
    "subprocess",
    "sunau",
    "symtable",
    "sys",
    "sysconfig",
    "syslog",
    "tabnanny",
    "tarfile",
    "telnetlib",
    "tempfile",
    "termios",
    "test",
    "textwrap",
    "threading",
    "time",
    "timeit",
    "tkinter",
    "token",
    "tokenize",
    "tomllib",
    "trace",
    "traceback",
    "tracemalloc",
    "tty",
    "turtle",
    "turtledemo",
    "types",
    "typing",
    "unicodedata",
    "unittest",
    "urllib",
    "uu",
    "uuid",
    "venv",
    "warnings",
    "wave",
    "weakref",
    "webbrowser",
    "winreg",
    "winsound",
    "wsgiref",
    "xdrlib",
    "xml",
    "xmlrpc",
    "zipapp",
    "zipfile",
    "zipimport",
    "zlib",
    "zoneinfo",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        // binary_search requires it
        for pair in STDLIB_MODULES.windows(2) {
            assert!(pair[0] < pair[1], "{} >= {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_classify_future() {
        assert_eq!(classify("__future__", &[]), ImportCategory::Future);
    }

    #[test]
    fn test_classify_stdlib() {
        assert_eq!(classify("os", &[]), ImportCategory::StdLib);
        assert_eq!(classify("os.path", &[]), ImportCategory::StdLib);
        assert_eq!(classify("collections.abc", &[]), ImportCategory::StdLib);
        assert_eq!(classify("cProfile", &[]), ImportCategory::StdLib);
    }

    #[test]
    fn test_classify_third_party() {
        assert_eq!(classify("requests", &[]), ImportCategory::ThirdParty);
        assert_eq!(classify("numpy.linalg", &[]), ImportCategory::ThirdParty);
    }

    #[test]
    fn test_classify_first_party() {
        let fp = vec!["myapp".to_string()];
        assert_eq!(classify("myapp.models", &fp), ImportCategory::FirstParty);
        assert_eq!(classify("myapplication", &fp), ImportCategory::ThirdParty);
    }

    #[test]
    fn test_first_party_shadows_stdlib() {
        let fp = vec!["json".to_string()];
        assert_eq!(classify("json", &fp), ImportCategory::FirstParty);
    }

    #[test]
    fn test_classify_relative() {
        assert_eq!(classify(".", &[]), ImportCategory::Relative);
        assert_eq!(classify("..pkg", &[]), ImportCategory::Relative);
    }

    #[test]
    fn test_category_output_order() {
        assert!(ImportCategory::Future < ImportCategory::StdLib);
        assert!(ImportCategory::StdLib < ImportCategory::ThirdParty);
        assert!(ImportCategory::ThirdParty < ImportCategory::FirstParty);
        assert!(ImportCategory::FirstParty < ImportCategory::Relative);
    }
}
