//! Functions for data io.
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Read and write a structure as JSON.
pub trait JSON: Serialize + DeserializeOwned + Sized {
    fn write_json<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(filename)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    fn read_json<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let reader = BufReader::new(File::open(filename)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
