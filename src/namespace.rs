use std::fmt;
use clap::ValueEnum;

/// Deployment namespace, selects vendor defaults for each platform stage
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum PlatformNamespace {
    Dev,
    Test,
    Prod
}

impl PlatformNamespace {
    /// PierianDx CGW API root. dev and test both talk to the UAT instance
    pub fn pieriandx_base_url(&self) -> &'static str {
        match self {
            PlatformNamespace::Dev | PlatformNamespace::Test => "https://app.uat.pieriandx.com/cgw-api/v2.0.0",
            PlatformNamespace::Prod => "https://app.pieriandx.com/cgw-api/v2.0.0"
        }
    }

    pub fn pieriandx_institution(&self) -> &'static str {
        match self {
            PlatformNamespace::Dev | PlatformNamespace::Test => "melbournetest",
            PlatformNamespace::Prod => "melbourne"
        }
    }

    /// Root of the vendor landing zone that sequencer runs are staged under
    pub fn sequencerrun_root(&self) -> &'static str {
        match self {
            PlatformNamespace::Dev | PlatformNamespace::Test => "s3://pdx-cgwxfer-test/melbournetest/",
            PlatformNamespace::Prod => "s3://pdx-xfer/melbourne/"
        }
    }
}

impl fmt::Display for PlatformNamespace {
      fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlatformNamespace::Dev => write!(f, "dev"),
            PlatformNamespace::Test => write!(f, "test"),
            PlatformNamespace::Prod => write!(f, "prod")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_dev_share_uat() {
        assert_eq!(PlatformNamespace::Dev.pieriandx_base_url(), PlatformNamespace::Test.pieriandx_base_url());
        assert!(PlatformNamespace::Prod.pieriandx_base_url().starts_with("https://app.pieriandx.com"));
        assert_eq!(PlatformNamespace::Prod.to_string(), "prod");
    }
}
