use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use linnet::Network;

pub fn load_network(filename: impl AsRef<Path>) -> Result<Network, String> {
    let file = File::open(filename.as_ref()).map_err(|err| err.to_string())?;
    serde_json::from_reader(BufReader::new(file)).map_err(|err| err.to_string())
}

pub fn save_network(filename: impl AsRef<Path>, network: &Network) -> Result<(), String> {
    let file = File::create(filename.as_ref()).map_err(|err| err.to_string())?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, network).map_err(|err| err.to_string())?;
    writer.flush().map_err(|err| err.to_string())
}
