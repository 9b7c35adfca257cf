use std::{io::Cursor, sync::Arc};

use image::{ImageFormat, Rgba, RgbaImage};
use passport::{
    BackgroundColor, Compositor, Country, EncodedImage, Layout, PassportConfig, PhotoSize,
    SegmentationMask, Settings, Snapshot, SourceImage,
    algorithms::normalize_mask,
    export::{self, ExportMode},
};

fn gradient_photo(width: u32, height: u32) -> SourceImage {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 96, 255])
    });
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    SourceImage::decode(EncodedImage::new("image/png", bytes)).unwrap()
}

fn snapshot(source: SourceImage, target: PassportConfig) -> Snapshot {
    Snapshot {
        source: Some(source),
        target: Some(target),
        ..Snapshot::default()
    }
}

fn no_border() -> Compositor {
    Compositor::new(Settings {
        border_color: None,
        ..Settings::default()
    })
}

#[test]
fn taiwan_single_export_has_format_resolution() {
    let snapshot = snapshot(gradient_photo(1200, 1600), *Country::Taiwan.config());
    let image = Compositor::default().render(&snapshot, Layout::Single).unwrap().unwrap();
    assert_eq!(image.dimensions(), (413, 531));
}

#[test]
fn single_export_dimensions_follow_the_mm_formula() {
    let source = gradient_photo(90, 120);
    for config in PassportConfig::all() {
        let expected = (
            (config.size.width_mm / 25.4 * 300.0).round() as u32,
            (config.size.height_mm / 25.4 * 300.0).round() as u32,
        );
        let image = Compositor::default()
            .render(&snapshot(source.clone(), *config), Layout::Single)
            .unwrap()
            .unwrap();
        assert_eq!(image.dimensions(), expected, "{}", config.country);
    }
}

#[test]
fn sheet_is_always_six_by_four_inches() {
    let source = gradient_photo(90, 120);
    for config in PassportConfig::all() {
        let image = Compositor::default()
            .render(&snapshot(source.clone(), *config), Layout::Sheet)
            .unwrap()
            .unwrap();
        assert_eq!(image.dimensions(), (1800, 1200), "{}", config.country);
    }
}

#[test]
fn opaque_mask_on_white_keeps_original_pixels() {
    let source = gradient_photo(1200, 1600);
    let opaque = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(1200, 1600, Rgba([255, 255, 255, 255])));
    let mask = SegmentationMask::Matte(Arc::new(normalize_mask(&opaque)));

    let mut masked = snapshot(source.clone(), *Country::Taiwan.config());
    masked.mask = Some(mask);
    masked.adjustments.background = BackgroundColor::WHITE;
    let with_mask = no_border().render(&masked, Layout::Single).unwrap().unwrap();

    let plain = snapshot(source.clone(), *Country::Taiwan.config());
    let original = no_border().render(&plain, Layout::Single).unwrap().unwrap();
    assert_eq!(with_mask, original);

    // without the mask the same white background goes through multiply,
    // which is where a darker result would come from
    let mut multiplied = snapshot(source, *Country::Taiwan.config());
    multiplied.adjustments.background = BackgroundColor::WHITE;
    let multiplied = no_border().render(&multiplied, Layout::Single).unwrap().unwrap();
    assert_eq!(multiplied, original);
}

#[test]
fn wide_format_fits_six_of_eight_cells() {
    let wide = PassportConfig {
        country: Country::Taiwan,
        flag: "",
        size: PhotoSize::new(50.0, 25.0),
        description: "50x25 mm",
    };
    let source = SourceImage::decode({
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(200, 100, Rgba([20, 20, 20, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        EncodedImage::new("image/png", bytes)
    })
    .unwrap();

    let compositor = Compositor::default();
    let cell = compositor.cell_size(wide.size);
    assert_eq!(cell, (591, 295));

    let slots = compositor.settings().sheet.slots((1800, 1200), cell);
    assert_eq!(slots.len(), 6);
    assert!(slots.iter().all(|(x, y)| x + cell.0 <= 1740 && y + cell.1 <= 1140));

    let sheet = compositor.render(&snapshot(source, wide), Layout::Sheet).unwrap().unwrap();
    for (x, y) in &slots {
        assert_eq!(sheet.get_pixel(x + cell.0 / 2, y + cell.1 / 2), &Rgba([20, 20, 20, 255]));
    }
    // the seventh cell would start a fourth row at y = 1065
    assert_eq!(sheet.get_pixel(60 + cell.0 / 2, 1100), &Rgba([255, 255, 255, 255]));
}

#[test]
fn export_is_deterministic() {
    let compositor = Compositor::default();
    let mut snapshot = snapshot(gradient_photo(300, 400), *Country::China.config());
    snapshot.adjustments.exposure = 15;
    snapshot.adjustments.contrast = -10;
    snapshot.adjustments.background = BackgroundColor::BLUE;
    snapshot.crop.zoom = 1.7;

    for mode in [ExportMode::Single, ExportMode::Sheet] {
        let first = export::export(&compositor, &snapshot, mode).unwrap().unwrap();
        let second = export::export(&compositor, &snapshot, mode).unwrap().unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.file_name, format!("Passport_{}_China.jpg", if mode == ExportMode::Single { "Single" } else { "Sheet" }));
    }
}
