/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 */

//! The fixed set of /idgames mirrors.

use std::fmt;
use std::str::FromStr;

use crate::error::WadboostError;

/// An /idgames mirror. Selection is up to the caller; there is no
/// health tracking or failover between mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirror {
    Florida,
    Greece,
    NewYork,
    Texas,
    FtpGermany,
    FtpGreece,
    FtpTexas,
}

/// How to reach a mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorKind {
    /// Origin URL, the archive lives under `<origin>idgames/`
    Http { origin: &'static str },
    /// Anonymous FTP host and the archive root on it
    Ftp {
        host: &'static str,
        base_path: &'static str,
    },
}

impl Mirror {
    pub const ALL: [Mirror; 7] = [
        Mirror::Florida,
        Mirror::Greece,
        Mirror::NewYork,
        Mirror::Texas,
        Mirror::FtpGermany,
        Mirror::FtpGreece,
        Mirror::FtpTexas,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Mirror::Florida => "florida",
            Mirror::Greece => "greece",
            Mirror::NewYork => "new-york",
            Mirror::Texas => "texas",
            Mirror::FtpGermany => "ftp-germany",
            Mirror::FtpGreece => "ftp-greece",
            Mirror::FtpTexas => "ftp-texas",
        }
    }

    pub fn kind(&self) -> MirrorKind {
        match self {
            Mirror::Florida => MirrorKind::Http {
                origin: "http://www.gamers.org/pub/",
            },
            Mirror::Greece => MirrorKind::Http {
                origin: "http://ftp.ntua.gr/pub/vendors/",
            },
            Mirror::NewYork => MirrorKind::Http {
                origin: "http://youfailit.net/pub/",
            },
            Mirror::Texas => MirrorKind::Http {
                origin: "http://ftp.mancubus.net/pub/",
            },
            Mirror::FtpGermany => MirrorKind::Ftp {
                host: "ftp.fu-berlin.de",
                base_path: "pc/games/idgames/",
            },
            Mirror::FtpGreece => MirrorKind::Ftp {
                host: "ftp.ntua.gr",
                base_path: "pub/vendors/idgames/",
            },
            Mirror::FtpTexas => MirrorKind::Ftp {
                host: "ftp.mancubus.net",
                base_path: "pub/idgames/",
            },
        }
    }

    pub fn is_ftp(&self) -> bool {
        matches!(self.kind(), MirrorKind::Ftp { .. })
    }

    /// Origin URL or FTP host, whichever identifies the mirror
    pub fn address(&self) -> &'static str {
        match self.kind() {
            MirrorKind::Http { origin } => origin,
            MirrorKind::Ftp { host, .. } => host,
        }
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Mirror::FtpGermany
    }
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mirror {
    type Err = WadboostError;

    /// Accepts a mirror name, an HTTP origin or an FTP host
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Mirror::ALL
            .iter()
            .copied()
            .find(|m| {
                m.name().eq_ignore_ascii_case(wanted)
                    || m.address().trim_end_matches('/') == wanted.trim_end_matches('/')
            })
            .ok_or_else(|| WadboostError::UnsupportedMirror(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_name_and_address() {
        assert_eq!("florida".parse::<Mirror>().unwrap(), Mirror::Florida);
        assert_eq!("FTP-Texas".parse::<Mirror>().unwrap(), Mirror::FtpTexas);
        assert_eq!(
            "http://ftp.ntua.gr/pub/vendors/".parse::<Mirror>().unwrap(),
            Mirror::Greece
        );
        assert_eq!("ftp.ntua.gr".parse::<Mirror>().unwrap(), Mirror::FtpGreece);
    }

    #[test]
    fn test_unknown_mirror() {
        match "ftp.example.org".parse::<Mirror>() {
            Err(WadboostError::UnsupportedMirror(m)) => assert_eq!(m, "ftp.example.org"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_kinds() {
        assert!(!Mirror::Florida.is_ftp());
        assert!(Mirror::FtpGermany.is_ftp());
        assert_eq!(
            Mirror::FtpGermany.kind(),
            MirrorKind::Ftp {
                host: "ftp.fu-berlin.de",
                base_path: "pc/games/idgames/"
            }
        );
        assert_eq!(Mirror::ALL.iter().filter(|m| m.is_ftp()).count(), 3);
    }

    #[test]
    fn test_names_round_trip() {
        for mirror in Mirror::ALL {
            assert_eq!(mirror.to_string().parse::<Mirror>().unwrap(), mirror);
        }
    }
}
