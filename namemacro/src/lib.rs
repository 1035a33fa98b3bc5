use std::{
    error::Error,
    fmt::{Display, Formatter},
};
use proc_macro::TokenStream;
use syn::{parse_macro_input, LitStr};
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::decompose_canonical;
use quote::quote;

// This mirrors `ResourceName::try_from_str` and its `NameError`. A proc-macro
// crate can't depend on the crate whose items it expands to, so the rules
// live in both places and have to be kept in step.
#[derive(Debug,PartialEq,Eq)]
enum NameError {
    Empty,
    Absolute,
    Directory,
    DoubleSlash,
    InvalidEndChar,
    InvalidChar,
    ReservedName,
    EscapedRoot,
    DotDotFile,
}

impl Display for NameError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            NameError::Empty
                => write!(fmt, "empty resource name"),
            NameError::Absolute
                => write!(fmt, "resource name is absolute"),
            NameError::Directory
                => write!(fmt, "resource name denotes a directory"),
            NameError::DoubleSlash
                => write!(fmt, "double slash in resource name"),
            NameError::InvalidEndChar
                => write!(fmt, "invalid end char in some component of \
                                resource name"),
            NameError::InvalidChar
                => write!(fmt, "invalid char in resource name"),
            NameError::ReservedName
                => write!(fmt, "reserved name in resource name"),
            NameError::EscapedRoot
                => write!(fmt, "resource name tried to escape its root (too \
                                many \"..\")"),
            NameError::DotDotFile
                => write!(fmt, "resource name ended with \"..\""),
        }
    }
}

impl Error for NameError {}

static INVALID_NAME_SUFFIX_CHAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[. ]$"#)
        .unwrap()
});
static INVALID_NAME_CHAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\x00-\x1F\u{0080}-\u{009F}"*:?\\<>|]"#)
        .unwrap()
});
static RESERVED_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?i:AUX|CO(?:M[1-9]|N)|LPT[1-9]|NUL|PRN)(?:\.|$)"#)
        .unwrap()
});

fn validated(s: &str) -> Result<String, NameError> {
    if s.is_empty() {
        return Err(NameError::Empty)
    }
    else if s.starts_with('/') {
        return Err(NameError::Absolute)
    }
    else if s.ends_with('/') {
        return Err(NameError::Directory)
    }
    else if s.ends_with("/..") || s == ".." {
        return Err(NameError::DotDotFile)
    }
    let mut kept: Vec<String> = vec![];
    for component in s.split('/') {
        if component.is_empty() {
            return Err(NameError::DoubleSlash)
        }
        else if component == "." {}
        else if component == ".." {
            if kept.pop().is_none() {
                return Err(NameError::EscapedRoot)
            }
        }
        else if INVALID_NAME_SUFFIX_CHAR_PATTERN.is_match(component) {
            return Err(NameError::InvalidEndChar)
        }
        else if INVALID_NAME_CHAR_PATTERN.is_match(component) {
            return Err(NameError::InvalidChar)
        }
        else if RESERVED_NAME_PATTERN.is_match(component) {
            return Err(NameError::ReservedName)
        }
        else {
            let mut decomposed = String::with_capacity(component.len());
            for c in component.chars() {
                decompose_canonical(c, |c| decomposed.push(c));
            }
            kept.push(decomposed);
        }
    }
    if kept.is_empty() {
        return Err(NameError::Empty)
    }
    Ok(kept.join("/"))
}

#[proc_macro]
pub fn n(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitStr);
    let value = match validated(&input.value()) {
        Ok(x) => x,
        Err(x) => {
            return proc_macro::TokenStream::from(syn::parse::Error::new_spanned(input, x.to_string()).to_compile_error())
        },
    };
    (quote!{
        ::csm_vfs::ResourceName::from_str_preverified(#value)
    }).into()
}
