use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, Command};
use wav_recorder_core::{Recorder, RecorderConfig};
use wav_recorder_cpal::{list_input_devices, CpalInputSource};

const FINALIZE_TIMEOUT: Duration = Duration::from_secs(5);

fn build_cli() -> Command {
    Command::new("wav-record")
        .about("Record mono PCM from an input device into a WAV file")
        .arg(
            Arg::new("output")
                .value_name("OUTPUT")
                .help("Path of the WAV file to write")
                .value_parser(value_parser!(PathBuf))
                .required_unless_present("list-devices"),
        )
        .arg(
            Arg::new("rate")
                .long("rate")
                .help("Sample rate in Hz")
                .value_parser(value_parser!(u32))
                .default_value("16000"),
        )
        .arg(
            Arg::new("bits")
                .long("bits")
                .help("Bit depth (8, 16, 24 or 32)")
                .value_parser(value_parser!(u16))
                .default_value("16"),
        )
        .arg(
            Arg::new("seconds")
                .long("seconds")
                .help("How long to record")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("5"),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .help("Input device name (default: host default input)"),
        )
        .arg(
            Arg::new("metadata")
                .long("metadata")
                .help("Write a .metadata.json sidecar next to the recording")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-devices")
                .long("list-devices")
                .help("List input devices and exit")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    if matches.get_flag("list-devices") {
        for device in list_input_devices().context("failed to list input devices")? {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("{}{}", device.name, marker);
        }
        return Ok(());
    }

    let output = matches
        .get_one::<PathBuf>("output")
        .context("an output path is required")?;
    let rate = *matches.get_one::<u32>("rate").expect("defaulted argument");
    let bits = *matches.get_one::<u16>("bits").expect("defaulted argument");
    let seconds = *matches.get_one::<u64>("seconds").expect("defaulted argument");

    let source = match matches.get_one::<String>("device") {
        Some(name) => CpalInputSource::with_device_name(name.clone()),
        None => CpalInputSource::default_device(),
    };
    let config = RecorderConfig {
        write_metadata: matches.get_flag("metadata"),
        ..Default::default()
    };

    let mut recorder = Recorder::with_config(source, config);
    recorder
        .configure(rate, bits)
        .context("failed to configure input device")?;
    recorder
        .start(output)
        .with_context(|| format!("failed to start recording to '{}'", output.display()))?;

    thread::sleep(Duration::from_secs(seconds));

    recorder.stop().context("failed to stop recording")?;
    if !recorder.wait_for_idle(FINALIZE_TIMEOUT) {
        bail!("capture worker did not finish within {:?}", FINALIZE_TIMEOUT);
    }

    let result = recorder
        .last_result()
        .context("recording finished without a result")?;
    if !result.finalized {
        bail!(
            "'{}' was written but its header could not be finalized",
            result.file_path.display()
        );
    }

    println!(
        "{}: {} bytes, {:.2}s, sha256 {}",
        result.file_path.display(),
        result.data_bytes,
        result.duration_secs,
        result.checksum
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let matches = build_cli().try_get_matches_from(["wav-record", "out.wav"]).unwrap();
        assert_eq!(matches.get_one::<u32>("rate"), Some(&16000));
        assert_eq!(matches.get_one::<u16>("bits"), Some(&16));
        assert_eq!(matches.get_one::<u64>("seconds"), Some(&5));
        assert!(!matches.get_flag("metadata"));
    }

    #[test]
    fn output_required_unless_listing() {
        assert!(build_cli().try_get_matches_from(["wav-record"]).is_err());
        assert!(build_cli()
            .try_get_matches_from(["wav-record", "--list-devices"])
            .is_ok());
    }

    #[test]
    fn zero_seconds_rejected() {
        assert!(build_cli()
            .try_get_matches_from(["wav-record", "out.wav", "--seconds", "0"])
            .is_err());
    }
}
