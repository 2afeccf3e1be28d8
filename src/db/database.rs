use anyhow::{anyhow, bail, Context, Result};
use bytes::{Buf, BufMut, BytesMut};
use log::{debug, info};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

use super::schemas::initialize_schema;
use super::types::{ProfileSummary, StoreInfo, FORMAT_MAJOR, FORMAT_VERSION};
use crate::error::ProfileError;
use crate::kmer::{check_length, number_of_kmers};
use crate::profile::Profile;

/// A file holding a named collection of profiles of one k-mer length
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new profile file or open an existing one
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open profile file: {}", path.display()))?;
        initialize_schema(&conn)?;

        let db = Database { conn };
        db.check_version()
            .with_context(|| format!("Cannot use profile file: {}", path.display()))?;
        Ok(db)
    }

    /// Open an existing profile file; a missing file is an error and is not
    /// created
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open profile file: {}", path.display()))?;

        let db = Database { conn };
        let version = db
            .stored_version()
            .with_context(|| format!("Not a profile file: {}", path.display()))?
            .ok_or_else(|| anyhow!("Not a profile file: {}", path.display()))?;
        check_major(&version)
            .with_context(|| format!("Cannot use profile file: {}", path.display()))?;
        Ok(db)
    }

    fn stored_version(&self) -> Result<Option<String>> {
        let version = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    fn check_version(&self) -> Result<()> {
        match self.stored_version()? {
            Some(version) => check_major(&version)?,
            None => {
                self.conn.execute(
                    "INSERT INTO metadata (key, value) VALUES ('version', ?1), ('producer', ?2)",
                    params![FORMAT_VERSION, producer()],
                )?;
            }
        }
        Ok(())
    }

    /// Format version and producer of this file
    pub fn info(&self) -> Result<StoreInfo> {
        let get = |key: &str| -> Result<String> {
            self.conn
                .query_row("SELECT value FROM metadata WHERE key = ?", params![key], |row| {
                    row.get(0)
                })
                .with_context(|| format!("Missing file attribute: {}", key))
        };

        Ok(StoreInfo {
            version: get("version")?,
            producer: get("producer")?,
        })
    }

    /// K-mer length shared by all profiles, if any are stored
    pub fn length(&self) -> Result<Option<usize>> {
        let length: Option<i64> = self
            .conn
            .query_row("SELECT length FROM profiles LIMIT 1", [], |row| row.get(0))
            .optional()?;
        Ok(length.map(|l| l as usize))
    }

    /// Save a profile and return the name it was stored under
    ///
    /// The name falls back to the profile's own name, then to the first free
    /// number counting from 1.
    pub fn save(&mut self, profile: &Profile, name: Option<&str>) -> Result<String> {
        if let Some(length) = self.length()? {
            if length != profile.length() {
                return Err(ProfileError::IncompatibleProfile {
                    left: length,
                    right: profile.length(),
                })
                .context("All profiles in a file must have the same k-mer length");
            }
        }

        let name = match name.or(profile.name.as_deref()) {
            Some(name) => name.to_string(),
            None => self.next_free_name()?,
        };

        if self.exists(&name)? {
            bail!("Profile {} already exists", name);
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO profiles (name, length, total, non_zero, mean, median, std, counts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                name,
                profile.length() as i64,
                profile.total() as i64,
                profile.non_zero() as i64,
                profile.mean(),
                profile.median(),
                profile.std(),
                encode_counts(profile.counts()),
            ],
        )?;
        tx.commit()?;

        info!("Saved profile {} (k = {})", name, profile.length());
        Ok(name)
    }

    fn exists(&self, name: &str) -> Result<bool> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM profiles WHERE name = ?", params![name], |_| Ok(true))
            .optional()?;
        Ok(exists.unwrap_or(false))
    }

    fn next_free_name(&self) -> Result<String> {
        let mut n = 1u64;
        loop {
            let name = n.to_string();
            if !self.exists(&name)? {
                return Ok(name);
            }
            n += 1;
        }
    }

    /// Get a profile by name
    pub fn get_profile(&self, name: &str) -> Result<Option<Profile>> {
        let row = self
            .conn
            .query_row(
                "SELECT length, counts FROM profiles WHERE name = ?",
                params![name],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .optional()?;

        let Some((length, blob)) = row else {
            return Ok(None);
        };

        let length = stored_length(length)
            .with_context(|| format!("Corrupt k-mer length for profile {}", name))?;
        let counts = decode_counts(&blob)
            .with_context(|| format!("Corrupt counts for profile {}", name))?;
        if counts.len() != number_of_kmers(length) {
            bail!(
                "Profile {} has {} counts, expected {} for k = {}",
                name,
                counts.len(),
                number_of_kmers(length),
                length
            );
        }

        Ok(Some(Profile::from_counts(counts, Some(name.to_string()))?))
    }

    /// Load a profile that must exist
    pub fn load(&self, name: &str) -> Result<Profile> {
        self.get_profile(name)?
            .ok_or_else(|| anyhow!("Profile {} not found", name))
    }

    /// Load several profiles, or all of them in name order when `names` is
    /// empty
    pub fn load_all(&self, names: &[String]) -> Result<Vec<Profile>> {
        let names = if names.is_empty() {
            self.names()?
        } else {
            names.to_vec()
        };
        names.iter().map(|name| self.load(name)).collect()
    }

    /// Names of all stored profiles, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        let names = self
            .conn
            .prepare("SELECT name FROM profiles ORDER BY name")?
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Stored statistics of one profile
    pub fn summary(&self, name: &str) -> Result<Option<ProfileSummary>> {
        let summary = self
            .conn
            .query_row(
                "SELECT name, length, total, non_zero, mean, median, std
                 FROM profiles WHERE name = ?",
                params![name],
                |row| {
                    Ok(ProfileSummary {
                        name: row.get(0)?,
                        length: row.get::<_, i64>(1)? as usize,
                        total: row.get::<_, i64>(2)? as u64,
                        non_zero: row.get::<_, i64>(3)? as usize,
                        mean: row.get(4)?,
                        median: row.get(5)?,
                        std: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(summary)
    }

    /// Remove a profile from the file
    pub fn remove_profile(&mut self, name: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM profiles WHERE name = ?", params![name])?;
        if removed > 0 {
            info!("Removed profile {}", name);
        }
        Ok(removed > 0)
    }

    /// Check stored counts against their recorded length and statistics
    pub fn validate(&self) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        let lengths: Vec<i64> = self
            .conn
            .prepare("SELECT DISTINCT length FROM profiles")?
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        if lengths.len() > 1 {
            report.add_error(format!("Profiles have different k-mer lengths: {:?}", lengths));
        }

        let mut stmt = self
            .conn
            .prepare("SELECT name, length, total, counts FROM profiles ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        for row in rows {
            let (name, length, total, blob) = row?;
            let length = match stored_length(length) {
                Ok(length) => length,
                Err(e) => {
                    report.add_error(format!("Profile {}: {}", name, e));
                    continue;
                }
            };
            match decode_counts(&blob) {
                Ok(counts) if counts.len() != number_of_kmers(length) => {
                    report.add_error(format!(
                        "Profile {} has {} counts, expected {}",
                        name,
                        counts.len(),
                        number_of_kmers(length)
                    ));
                }
                Ok(counts) => {
                    let sum: u64 = counts.iter().sum();
                    if sum != total as u64 {
                        report.add_error(format!(
                            "Profile {} records total {} but its counts sum to {}",
                            name, total, sum
                        ));
                    }
                    if sum == 0 {
                        report.add_warning(format!("Profile {} is empty", name));
                    }
                }
                Err(e) => report.add_error(format!("Profile {}: {}", name, e)),
            }
        }

        Ok(report)
    }
}

#[derive(Default, Debug)]
pub struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    fn add_error<S: Into<String>>(&mut self, msg: S) {
        self.errors.push(msg.into());
    }

    fn add_warning<S: Into<String>>(&mut self, msg: S) {
        self.warnings.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn producer() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn check_major(version: &str) -> Result<()> {
    if parse_major(version)? != FORMAT_MAJOR {
        bail!("file format version {} not supported", version);
    }
    debug!("Opened profile file with format version {}", version);
    Ok(())
}

/// A stored k-mer length, rejected unless it is a usable one
fn stored_length(length: i64) -> Result<usize> {
    let length = usize::try_from(length).map_err(|_| anyhow!("negative k-mer length {}", length))?;
    check_length(length)?;
    Ok(length)
}

fn parse_major(version: &str) -> Result<u64> {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .ok_or_else(|| anyhow!("Malformed file format version: {}", version))
}

fn encode_counts(counts: &[u64]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(counts.len() * 8);
    for &count in counts {
        buf.put_u64_le(count);
    }
    buf.to_vec()
}

fn decode_counts(mut blob: &[u8]) -> Result<Vec<u64>> {
    if blob.len() % 8 != 0 {
        bail!("count data of {} bytes is not a whole number of counts", blob.len());
    }
    let mut counts = Vec::with_capacity(blob.len() / 8);
    while blob.has_remaining() {
        counts.push(blob.get_u64_le());
    }
    Ok(counts)
}
