//! Decodes every frame of a FLAC file given on the command line and
//! prints the stream's STREAMINFO, Vorbis comments, and whether the
//! decoded PCM matches the stream's declared MD5 signature.
//!
//! Not part of the `flacore` core: this is a thin demonstration of the
//! public API, analogous to the file-driving demos that ship alongside
//! the crates this one was grounded on.

use std::env;
use std::fs::File;

use flacore::decoder::FlacDecoder;

fn main() {
    tracing_subscriber::fmt::init();

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: decode_info <file.flac>");
            std::process::exit(1);
        }
    };

    let file = File::open(&path).expect("failed to open input file");
    let mut decoder = FlacDecoder::new(file);
    decoder.initialize().expect("failed to parse metadata");

    let info = decoder.stream_info().expect("initialize populates stream_info").clone();
    println!("sample rate:    {} Hz", info.sample_rate);
    println!("channels:       {}", info.channels);
    println!("bits/sample:    {}", info.bits_per_sample);
    println!("total samples:  {}", info.total_samples);

    if let Some(vc) = decoder.vorbis_comment() {
        println!("vendor:         {}", vc.vendor);
        for (key, value) in &vc.comments {
            println!("  {key} = {value}");
        }
    }

    while !decoder.eos().expect("eos probe failed") {
        decoder.decode_frame().expect("frame decode failed");
    }

    println!("frames decoded: {}", decoder.frame_count());
    println!("samples decoded:{}", decoder.sample_count());

    let digest = decoder.finalize_md5();
    if info.md5_is_absent() {
        println!("md5:            not declared by the stream");
    } else if digest == info.md5_signature {
        println!("md5:            matches ({})", hex(&digest));
    } else {
        println!(
            "md5:            MISMATCH (decoded {}, declared {})",
            hex(&digest),
            hex(&info.md5_signature)
        );
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
