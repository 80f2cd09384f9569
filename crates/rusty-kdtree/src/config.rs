//! Build configuration.

use serde::{Deserialize, Serialize};

use crate::{
    constants::LEAF_SIZE,
    data::JSON,
    error::{Error, Result},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Windows with at most this many points become leaves.
    pub leaf_size: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            leaf_size: LEAF_SIZE,
        }
    }
}

impl TreeConfig {
    pub fn with_leaf_size(leaf_size: usize) -> Result<TreeConfig> {
        let config = TreeConfig { leaf_size };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.leaf_size == 0 {
            return Err(Error::LeafSize(self.leaf_size));
        }
        Ok(())
    }
}

impl JSON for TreeConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(TreeConfig::default().leaf_size, LEAF_SIZE);

        let parsed: TreeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, TreeConfig::default());

        let parsed: TreeConfig = serde_json::from_str(r#"{"leaf_size": 8}"#).unwrap();
        assert_eq!(parsed.leaf_size, 8);
    }

    #[test]
    fn test_validate() {
        assert!(matches!(TreeConfig::with_leaf_size(0), Err(Error::LeafSize(0))));
        assert!(TreeConfig::with_leaf_size(1).is_ok());
    }

    #[test]
    fn test_json_file() {
        let path = std::env::temp_dir()
            .join(format!("rusty_kdtree_config_{}.json", std::process::id()));
        let config = TreeConfig::with_leaf_size(12).unwrap();

        config.write_json(&path).unwrap();
        let read = TreeConfig::read_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(read, config);
    }
}
