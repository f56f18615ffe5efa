use std::io::Cursor;

use image::{Rgb, RgbImage};
use kenburns::{
    CancelToken, ContainerFormat, EncoderSupport, Fps, KenBurnsError, MotionSpec, RenderParams,
    RenderThreading, SourceImage, SynthesisConfig, SynthesisLimits, SynthesisRequest,
    Synthesizer, crop_window, frame_progress, render_frames,
};

fn checker(w: u32, h: u32) -> SourceImage {
    SourceImage::from_rgb(RgbImage::from_fn(w, h, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([230, 40, 40])
        } else {
            Rgb([20, 60, 220])
        }
    }))
    .unwrap()
}

fn gif_only_engine() -> Synthesizer {
    Synthesizer::with_support(SynthesisConfig::default(), EncoderSupport::gif_only())
}

fn decode_gif_frames(bytes: &[u8]) -> (u16, u16, usize) {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = opts.read_info(bytes).unwrap();
    let (w, h) = (decoder.width(), decoder.height());
    let mut n = 0;
    while decoder.read_next_frame().unwrap().is_some() {
        n += 1;
    }
    (w, h, n)
}

#[test]
fn zoom_in_two_seconds_at_ten_fps() {
    let src = checker(512, 512);
    let params = RenderParams::preset(
        "zoom_in",
        2.0,
        Fps::new(10).unwrap(),
        ContainerFormat::Gif,
    );
    assert_eq!(params.frame_count().unwrap(), 20);

    let first = crop_window(
        src.canvas(),
        params.motion.evaluate(frame_progress(kenburns::FrameIndex(0), 20)),
    );
    assert_eq!((first.x, first.y, first.width, first.height), (0, 0, 512, 512));
    let last = crop_window(
        src.canvas(),
        params.motion.evaluate(frame_progress(kenburns::FrameIndex(19), 20)),
    );
    assert_eq!((last.width, last.height), (393, 393));
    assert_eq!((last.x, last.y), ((512 - 393) / 2, (512 - 393) / 2));

    let frames = render_frames(
        &src,
        &params.motion,
        20,
        &RenderThreading::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(frames.len(), 20);
    assert!(frames.iter().all(|f| f.dimensions() == (512, 512)));
}

#[test]
fn custom_single_frame_uses_start_state() {
    let motion = MotionSpec {
        start_scale: 1.0,
        end_scale: 1.0,
        start_x: 0.2,
        end_x: 0.8,
        start_y: 0.5,
        end_y: 0.5,
    };
    let params = RenderParams::custom(motion, 1.0, Fps::new(1).unwrap(), ContainerFormat::Gif);
    assert_eq!(params.frame_count().unwrap(), 1);
    let state = motion.evaluate(frame_progress(kenburns::FrameIndex(0), 1));
    assert_eq!(state.cx, 0.2);

    let out = gif_only_engine()
        .synthesize_with_params(&checker(32, 16), &params, &CancelToken::new())
        .unwrap();
    assert_eq!(out.frame_count, 1);
    assert_eq!(decode_gif_frames(&out.bytes), (32, 16, 1));
}

#[test]
fn one_frame_gif_round_trips_through_image_decoder() {
    let params = RenderParams::preset("slow_drift", 1.0, Fps::new(1).unwrap(), ContainerFormat::Gif);
    let out = gif_only_engine()
        .synthesize_with_params(&checker(40, 24), &params, &CancelToken::new())
        .unwrap();
    let decoded = image::load_from_memory_with_format(&out.bytes, image::ImageFormat::Gif).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (40, 24));
}

#[test]
fn mp4_without_encoder_reports_gif() {
    let req = SynthesisRequest {
        preset: "pan_right".to_string(),
        duration: 1.0,
        fps: 12.0,
        format: ContainerFormat::Mp4,
        motion: None,
    };
    let out = gif_only_engine()
        .synthesize(&checker(24, 24), &req, &CancelToken::new())
        .unwrap();
    assert_eq!(out.format, ContainerFormat::Gif);
    assert_eq!(out.requested_format, ContainerFormat::Mp4);
    assert!(out.fell_back());
    assert_eq!(decode_gif_frames(&out.bytes), (24, 24, 12));
}

#[test]
fn request_from_encoded_png_with_odd_size() {
    let img = RgbImage::from_pixel(33, 21, Rgb([10, 200, 30]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let req = SynthesisRequest::from_json_str(r#"{"preset": "zoom_out", "duration": 1, "fps": 12}"#)
        .unwrap();
    let out = gif_only_engine()
        .synthesize_bytes(&png, &req, &CancelToken::new())
        .unwrap();
    assert_eq!((out.width, out.height), (32, 20));
    assert_eq!(out.frame_count, 12);
    assert_eq!(out.preset, "zoom_out");
    assert_eq!(decode_gif_frames(&out.bytes), (32, 20, 12));
}

#[test]
fn oversized_requests_are_rejected_before_rendering() {
    let cfg = SynthesisConfig {
        limits: SynthesisLimits {
            max_frame_bytes: 64 * 64 * 3 * 10,
            timeout_secs: None,
        },
        ..SynthesisConfig::default()
    };
    let engine = Synthesizer::with_support(cfg, EncoderSupport::gif_only());
    let params = RenderParams::preset("zoom_in", 1.0, Fps::new(12).unwrap(), ContainerFormat::Gif);
    let err = engine
        .synthesize_with_params(&checker(64, 64), &params, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::ResourceExhausted(_)), "{err}");
}

#[test]
fn degenerate_scale_is_rejected() {
    let motion = MotionSpec {
        end_scale: 9.0,
        ..MotionSpec::default()
    };
    let params = RenderParams::custom(motion, 1.0, Fps::new(12).unwrap(), ContainerFormat::Gif);
    let err = gif_only_engine()
        .synthesize_with_params(&checker(8, 8), &params, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::DegenerateGeometry(_)), "{err}");
}

#[test]
fn undecodable_source_is_invalid_input() {
    let err = gif_only_engine()
        .synthesize_bytes(b"\x89PNG broken", &SynthesisRequest::default(), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::InvalidInput(_)), "{err}");
}

#[test]
fn cancelled_request_produces_nothing() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = gif_only_engine()
        .synthesize(&checker(16, 16), &SynthesisRequest::default(), &cancel)
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::Cancelled(_)), "{err}");
}
