use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::CatalogError;
use crate::kernel::Geodetic;

/// Ground station location. Longitude is positive west, altitude in whole
/// metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qth {
    pub callsign: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: i32,
}

impl Default for Qth {
    fn default() -> Self {
        Self {
            callsign: "N0CALL".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0,
        }
    }
}

impl Qth {
    /// Reads the four value station file: callsign on the first line, then
    /// latitude, longitude and altitude separated by whitespace.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        Self::parse(&content).map_err(|message| CatalogError::Qth {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let mut lines = content.lines();
        let callsign = lines
            .next()
            .map(|l| l.trim().chars().take(15).collect::<String>())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| "missing callsign".to_string())?;

        let mut values = lines.flat_map(str::split_whitespace);
        let mut next = |what: &str| {
            values
                .next()
                .ok_or_else(|| format!("missing {what}"))
                .map(str::to_string)
        };
        let latitude = next("latitude")?;
        let longitude = next("longitude")?;
        let altitude = next("altitude")?;

        Ok(Self {
            callsign,
            latitude: latitude
                .parse()
                .map_err(|_| format!("invalid latitude {latitude:?}"))?,
            longitude: longitude
                .parse()
                .map_err(|_| format!("invalid longitude {longitude:?}"))?,
            altitude: altitude
                .parse()
                .map_err(|_| format!("invalid altitude {altitude:?}"))?,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let content = format!(
            "{}\n {}\n {}\n {}\n",
            self.callsign, self.latitude, self.longitude, self.altitude
        );
        fs::write(path, content).map_err(|e| CatalogError::io(path, e))
    }

    /// Observer position with longitude converted to east positive.
    pub fn to_geodetic(&self) -> Geodetic {
        Geodetic::from_degrees(
            self.latitude,
            -self.longitude,
            self.altitude as f64 / 1000.0,
        )
    }
}
