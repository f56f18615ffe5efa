#[cfg(feature = "media-ffmpeg")]
mod media_pipeline {
    use std::path::Path;

    use image::{Rgb, RgbImage};
    use kenburns::encode::ffmpeg::is_ffmpeg_available;
    use kenburns::{
        CancelToken, ContainerFormat, EncodeOpts, EncoderSupport, Fps, RenderParams,
        SourceImage, SynthesisConfig, Synthesizer, encode,
    };

    fn ffmpeg_available() -> bool {
        is_ffmpeg_available(Path::new("ffmpeg"))
    }

    fn is_mp4(bytes: &[u8]) -> bool {
        bytes.len() > 12 && &bytes[4..8] == b"ftyp"
    }

    #[test]
    fn detected_mp4_support_encodes_mp4() {
        if !ffmpeg_available() {
            eprintln!("skipping: ffmpeg with libx264 not on PATH");
            return;
        }
        let engine = Synthesizer::new(SynthesisConfig::default());
        assert!(engine.support().mp4);

        let src = SourceImage::from_rgb(RgbImage::from_fn(64, 48, |x, y| {
            Rgb([(x * 4) as u8, (y * 5) as u8, 128])
        }))
        .unwrap();
        let params =
            RenderParams::preset("pan_down", 1.0, Fps::new(12).unwrap(), ContainerFormat::Mp4);
        let out = engine
            .synthesize_with_params(&src, &params, &CancelToken::new())
            .unwrap();
        assert_eq!(out.format, ContainerFormat::Mp4);
        assert!(!out.fell_back());
        assert!(is_mp4(&out.bytes));
    }

    #[test]
    fn direct_encode_leaves_no_temp_files() {
        if !ffmpeg_available() {
            eprintln!("skipping: ffmpeg with libx264 not on PATH");
            return;
        }
        let tmp = std::path::PathBuf::from("target").join("media_pipeline_tmp");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let mut opts = EncodeOpts::default();
        opts.mp4.temp_dir = Some(tmp.clone());
        let frames: Vec<RgbImage> = (0..6u8)
            .map(|i| RgbImage::from_pixel(32, 32, Rgb([i * 40, 10, 10])))
            .collect();
        let out = encode(
            &frames,
            Fps::new(24).unwrap(),
            ContainerFormat::Mp4,
            EncoderSupport { mp4: true },
            &opts,
        )
        .unwrap();
        assert!(is_mp4(&out.bytes));
        assert_eq!(std::fs::read_dir(&tmp).unwrap().count(), 0);
    }
}
