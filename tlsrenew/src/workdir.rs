use std::path::{Path, PathBuf};

/// Layout of the ACME client checkout.
#[derive(Debug, Clone)]
pub struct ClientDir {
    dir: PathBuf,
}

impl ClientDir {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.dir
    }

    pub fn is_installed(&self) -> bool {
        self.dir.exists()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config")
    }

    pub fn domains_path(&self) -> PathBuf {
        self.dir.join("domains.txt")
    }

    pub fn script_path(&self, script: &str) -> PathBuf {
        self.dir.join(script)
    }

    pub fn certs_dir(&self) -> PathBuf {
        self.dir.join("certs")
    }

    pub fn cert_dir(&self, alias: &str) -> PathBuf {
        self.certs_dir().join(alias)
    }
}

/// Files the ACME client writes for one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertDir {
    dir: PathBuf,
}

impl CertDir {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.dir
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join("privkey.pem")
    }

    pub fn cert_path(&self) -> PathBuf {
        self.dir.join("cert.pem")
    }

    pub fn chain_path(&self) -> PathBuf {
        self.dir.join("chain.pem")
    }

    /// Upload order expected by the hosting API.
    pub fn bundle_paths(&self) -> [PathBuf; 3] {
        [self.key_path(), self.cert_path(), self.chain_path()]
    }
}
