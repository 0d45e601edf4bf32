//! Per-watch interest filter
//!
//! A watch reports only the change categories selected in its filter mask.
//! The bit values are a published, fixed table; integrations that cross a
//! language boundary rely on them staying stable.

use crate::error::{Error, Result};
use bitflags::bitflags;

bitflags! {
    /// Bitset of change categories a watch reports
    ///
    /// | bit    | flag          | reports                              |
    /// |--------|---------------|--------------------------------------|
    /// | 0x0001 | `FILE_NAME`   | create/delete/rename of files        |
    /// | 0x0002 | `DIR_NAME`    | create/delete/rename of directories  |
    /// | 0x0004 | `ATTRIBUTES`  | metadata/permission changes          |
    /// | 0x0008 | `SIZE`        | size changes                         |
    /// | 0x0010 | `LAST_WRITE`  | content writes                       |
    /// | 0x0020 | `LAST_ACCESS` | read accesses                        |
    /// | 0x0040 | `CREATION`    | creation-time changes                |
    /// | 0x0100 | `SECURITY`    | ownership/ACL changes                |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FilterMask: u32 {
        const FILE_NAME   = 0x0001;
        const DIR_NAME    = 0x0002;
        const ATTRIBUTES  = 0x0004;
        const SIZE        = 0x0008;
        const LAST_WRITE  = 0x0010;
        const LAST_ACCESS = 0x0020;
        const CREATION    = 0x0040;
        const SECURITY    = 0x0100;
    }
}

impl FilterMask {
    /// Categories covering create/delete/rename of both files and directories
    pub fn name_changes() -> Self {
        Self::FILE_NAME | Self::DIR_NAME
    }

    /// Categories covering content writes
    pub fn content_changes() -> Self {
        Self::SIZE | Self::LAST_WRITE
    }

    /// Parse a comma-separated list of category names
    ///
    /// Accepted tokens: `file-name`, `dir-name`, `name` (both name
    /// categories), `attributes`, `size`, `last-write`, `content` (size +
    /// last-write), `last-access`, `creation`, `security`, `all`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut mask = Self::empty();
        for token in spec.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            mask |= match token {
                "file-name" => Self::FILE_NAME,
                "dir-name" => Self::DIR_NAME,
                "name" => Self::name_changes(),
                "attributes" => Self::ATTRIBUTES,
                "size" => Self::SIZE,
                "last-write" => Self::LAST_WRITE,
                "content" => Self::content_changes(),
                "last-access" => Self::LAST_ACCESS,
                "creation" => Self::CREATION,
                "security" => Self::SECURITY,
                "all" => Self::all(),
                other => return Err(Error::config(format!("unknown filter category `{other}`"))),
            };
        }
        if mask.is_empty() {
            return Err(Error::config("filter selects no categories"));
        }
        Ok(mask)
    }
}

impl Default for FilterMask {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_published_bit_values() {
        assert_eq!(FilterMask::FILE_NAME.bits(), 0x0001);
        assert_eq!(FilterMask::DIR_NAME.bits(), 0x0002);
        assert_eq!(FilterMask::ATTRIBUTES.bits(), 0x0004);
        assert_eq!(FilterMask::SIZE.bits(), 0x0008);
        assert_eq!(FilterMask::LAST_WRITE.bits(), 0x0010);
        assert_eq!(FilterMask::LAST_ACCESS.bits(), 0x0020);
        assert_eq!(FilterMask::CREATION.bits(), 0x0040);
        assert_eq!(FilterMask::SECURITY.bits(), 0x0100);
    }

    #[test]
    fn test_parse_tokens() {
        let mask = FilterMask::parse("name,content").expect("valid spec");
        assert_eq!(
            mask,
            FilterMask::FILE_NAME | FilterMask::DIR_NAME | FilterMask::SIZE | FilterMask::LAST_WRITE
        );

        assert_eq!(FilterMask::parse("all").expect("valid spec"), FilterMask::all());
        assert_eq!(
            FilterMask::parse(" size , security ").expect("valid spec"),
            FilterMask::SIZE | FilterMask::SECURITY
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert!(FilterMask::parse("bogus").is_err());
        assert!(FilterMask::parse("").is_err());
        assert!(FilterMask::parse(" , ").is_err());
    }

    #[test]
    fn test_default_selects_everything() {
        assert_eq!(FilterMask::default(), FilterMask::all());
    }
}
