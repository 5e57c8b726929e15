use proptest::prelude::*;
use qatcodec::codec::qat::status::QZ_NOSW_NO_HW;
use qatcodec::codec::qat::{
    DeviceConfig, EmulatedBackend, EmulatedDevice, PollingMode, QatCodec, SessionParams,
};
use qatcodec::codec::{Codec, CodecError, Operation};

fn codec_on(device: &EmulatedDevice) -> QatCodec<EmulatedBackend> {
    QatCodec::emulated(device, SessionParams::default()).unwrap()
}

fn compress(codec: &mut impl Codec, input: &[u8]) -> Vec<u8> {
    let mut out = vec![0; codec.max_compressed_len(input.len())];
    let n = codec.compress(input, &mut out).unwrap();
    out.truncate(n);
    out
}

#[test]
fn hello_world_round_trip() {
    let device = EmulatedDevice::new(DeviceConfig::default());
    let mut codec = codec_on(&device);
    let input = b"Hello, world!";
    assert_eq!(input.len(), 13);

    let compressed = compress(&mut codec, input);
    assert!(!compressed.is_empty());
    assert!(compressed.len() <= codec.max_compressed_len(13));

    let mut output = [0u8; 13];
    assert_eq!(codec.decompress(&compressed, &mut output), Ok(13));
    assert_eq!(&output, input);
}

#[test]
fn zero_length_input() {
    let device = EmulatedDevice::new(DeviceConfig::default());
    let mut codec = codec_on(&device);
    let compressed = compress(&mut codec, &[]);
    assert!(compressed.len() <= codec.max_compressed_len(0));

    let mut output = [0u8; 0];
    assert_eq!(codec.decompress(&compressed, &mut output), Ok(0));
}

#[test]
fn short_output_buffer_is_an_error() {
    let device = EmulatedDevice::new(DeviceConfig::default());
    let mut codec = codec_on(&device);
    let input = b"twenty-six letters a to z".repeat(40);
    let compressed = compress(&mut codec, &input);

    for len in [0, 1, input.len() / 2, input.len() - 1] {
        let mut output = vec![0u8; len];
        assert_eq!(
            codec.decompress(&compressed, &mut output),
            Err(CodecError::OperationFailed(Operation::Decompress)),
            "buffer of {} bytes",
            len
        );
    }

    // The session is still usable afterwards.
    let mut output = vec![0u8; input.len()];
    assert_eq!(codec.decompress(&compressed, &mut output), Ok(input.len()));
}

#[test]
fn streaming_is_unsupported_before_and_after_use() {
    let device = EmulatedDevice::new(DeviceConfig::default());
    let mut codec = codec_on(&device);
    let check = |codec: &QatCodec<EmulatedBackend>| {
        assert!(matches!(
            codec.make_streaming_compressor(),
            Err(CodecError::UnsupportedOperation(Operation::Compress))
        ));
        assert!(matches!(
            codec.make_streaming_decompressor(),
            Err(CodecError::UnsupportedOperation(Operation::Decompress))
        ));
    };

    check(&codec);
    let first = compress(&mut codec, b"streaming guard");
    check(&codec);
    let second = compress(&mut codec, b"streaming guard");
    assert_eq!(first, second);

    let mut output = [0u8; 15];
    assert_eq!(codec.decompress(&second, &mut output), Ok(15));
    check(&codec);
    assert_eq!(device.open_sessions(), 1);
}

#[test]
fn fatal_setup_leaves_nothing_allocated() {
    let device = EmulatedDevice::new(DeviceConfig {
        hardware_present: false,
        supports_busy_polling: false,
        ..Default::default()
    });

    let no_device = SessionParams { sw_backup: false, ..Default::default() };
    assert_eq!(
        QatCodec::emulated(&device, no_device).err(),
        Some(CodecError::ResourceUnavailable { op: Operation::Init, code: QZ_NOSW_NO_HW })
    );
    assert_eq!(device.open_sessions(), 0);

    let busy = SessionParams::with_polling_mode(PollingMode::Busy);
    assert_eq!(
        QatCodec::emulated(&device, busy).err(),
        Some(CodecError::InvalidParams(Operation::SetupSession))
    );
    assert_eq!(device.open_sessions(), 0);

    assert_eq!(
        "spin".parse::<PollingMode>(),
        Err(CodecError::InvalidParams(Operation::SetupSession))
    );
}

#[test]
fn codecs_move_between_threads() {
    let device = EmulatedDevice::new(DeviceConfig::default());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let mut codec = codec_on(&device);
            std::thread::spawn(move || {
                let input = format!("session per thread #{}", i).repeat(50).into_bytes();
                let compressed = compress(&mut codec, &input);
                let mut output = vec![0; input.len()];
                codec.decompress(&compressed, &mut output).unwrap();
                output == input
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(device.open_sessions(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn round_trip(input in proptest::collection::vec(any::<u8>(), 0..20_000)) {
        let device = EmulatedDevice::new(DeviceConfig::default());
        let mut codec = codec_on(&device);
        let compressed = compress(&mut codec, &input);
        let mut output = vec![0; input.len()];
        let n = codec.decompress(&compressed, &mut output).unwrap();
        prop_assert_eq!(n, input.len());
        prop_assert_eq!(output, input);
    }

    #[test]
    fn bound_covers_output(input in proptest::collection::vec(any::<u8>(), 0..70_000), level in 1u32..=9) {
        let device = EmulatedDevice::new(DeviceConfig::default());
        let params = SessionParams { compression_level: level, ..Default::default() };
        let mut codec = QatCodec::emulated(&device, params).unwrap();
        let bound = codec.max_compressed_len(input.len());
        let mut out = vec![0; bound];
        let n = codec.compress(&input, &mut out).unwrap();
        prop_assert!(n <= bound);
    }

    #[test]
    fn bound_is_monotonic(a in 0usize..1 << 33, b in 0usize..1 << 33) {
        let device = EmulatedDevice::new(DeviceConfig::default());
        let codec = codec_on(&device);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(codec.max_compressed_len(lo) <= codec.max_compressed_len(hi));
    }
}
