// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! Persistent key-value side channel shared between the plant and confirm
//! phases. One file per key under a state directory; values are opaque
//! strings. Writes go through a temp file plus rename so a concurrent
//! reader of the same key never observes a torn value. Distinct ticks use
//! distinct keys, so there is no wider locking requirement.

use std::fs;
use std::io;
use std::path::PathBuf;

pub struct StateStore {
    dir: PathBuf,
}

const USERNAME_KEY: &str = "username";
const PASSWORD_KEY: &str = "password";

fn tick_key(tick: u64, field: &str) -> String {
    format!("tick-{tick}-{field}")
}

impl StateStore {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn store(&self, key: &str, value: &str) -> io::Result<()> {
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(tmp, self.dir.join(key))
    }

    /// Returns `None` for a key that was never stored; that is a
    /// distinguishable condition, not an error.
    pub fn load(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.dir.join(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn store_credentials(&self, tick: u64, username: &str, password: &str) -> io::Result<()> {
        self.store(&tick_key(tick, USERNAME_KEY), username)?;
        self.store(&tick_key(tick, PASSWORD_KEY), password)
    }

    /// Credentials planted for `tick`, or `None` if either half is missing.
    pub fn credentials(&self, tick: u64) -> io::Result<Option<(String, String)>> {
        let Some(username) = self.load(&tick_key(tick, USERNAME_KEY))? else {
            return Ok(None);
        };
        let Some(password) = self.load(&tick_key(tick, PASSWORD_KEY))? else {
            return Ok(None);
        };
        Ok(Some((username, password)))
    }
}
