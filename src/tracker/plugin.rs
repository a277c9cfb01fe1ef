use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;

/// Antenna rotator and radio hooks driven while a single satellite is in
/// range. Frequencies in Hz, angles in degrees.
pub trait RigControl: Send {
    fn name(&self) -> &str;

    fn set_rotor(&mut self, azimuth: f64, elevation: f64) -> io::Result<()>;

    fn set_uplink_frequency(&mut self, _hz: f64) -> io::Result<()> {
        Ok(())
    }

    fn set_downlink_frequency(&mut self, _hz: f64) -> io::Result<()> {
        Ok(())
    }
}

/// Rotator interface speaking `AZxxx.x ELxx.x` lines on a serial port.
pub struct SerialAntenna<W: Write + Send> {
    out: W,
    once_per_second: bool,
    last: Option<(i32, i32, i64)>,
}

impl SerialAntenna<File> {
    /// Opens the device for writing. Line settings are left as configured
    /// on the port.
    pub fn open(path: &Path, once_per_second: bool) -> io::Result<Self> {
        let out = OpenOptions::new().write(true).open(path)?;
        log::info!(
            "antenna output on {}{}",
            path.display(),
            if once_per_second { ", once per second" } else { "" }
        );
        Ok(Self::new(out, once_per_second))
    }
}

impl<W: Write + Send> SerialAntenna<W> {
    /// With `once_per_second` the position is repeated every second even
    /// when unchanged; otherwise only changes are written.
    pub fn new(out: W, once_per_second: bool) -> Self {
        Self {
            out,
            once_per_second,
            last: None,
        }
    }

    pub fn write_at(&mut self, azimuth: f64, elevation: f64, now: i64) -> io::Result<()> {
        let az = azimuth.round() as i32;
        let el = elevation.round() as i32;

        let due = match self.last {
            None => true,
            Some((last_az, last_el, last_second)) => {
                (az, el) != (last_az, last_el) || (self.once_per_second && now != last_second)
            }
        };
        if !due {
            return Ok(());
        }

        write!(self.out, "AZ{:3.1} EL{:3.1} \r\n", az as f64, el as f64)?;
        self.out.flush()?;
        self.last = Some((az, el, now));
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write + Send> RigControl for SerialAntenna<W> {
    fn name(&self) -> &str {
        "serial antenna"
    }

    fn set_rotor(&mut self, azimuth: f64, elevation: f64) -> io::Result<()> {
        self.write_at(azimuth, elevation, Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(antenna: &SerialAntenna<Vec<u8>>) -> String {
        String::from_utf8(antenna.get_ref().clone()).unwrap()
    }

    #[test]
    fn writes_rounded_position() {
        let mut antenna = SerialAntenna::new(Vec::new(), false);
        antenna.write_at(123.4, 45.6, 0).unwrap();
        assert_eq!(written(&antenna), "AZ123.0 EL46.0 \r\n");
    }

    #[test]
    fn skips_unchanged_position() {
        let mut antenna = SerialAntenna::new(Vec::new(), false);
        antenna.write_at(10.2, 5.1, 0).unwrap();
        antenna.write_at(9.8, 4.9, 1).unwrap();
        antenna.write_at(11.0, 5.0, 2).unwrap();
        assert_eq!(written(&antenna), "AZ10.0 EL5.0 \r\nAZ11.0 EL5.0 \r\n");
    }

    #[test]
    fn repeats_each_second_when_asked() {
        let mut antenna = SerialAntenna::new(Vec::new(), true);
        antenna.write_at(10.0, 5.0, 100).unwrap();
        antenna.write_at(10.0, 5.0, 100).unwrap();
        antenna.write_at(10.0, 5.0, 101).unwrap();
        assert_eq!(written(&antenna).matches("AZ10.0").count(), 2);
    }
}
