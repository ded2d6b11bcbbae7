//! Vector tile compositor
//!
//! Embeds the source page into the output PDF as a Form XObject instead of
//! rasterizing it, so text and line art stay resolution independent. The
//! page's whole drawing payload is copied once; every sheet then places the
//! same form with a per-tile transform. Fonts and other resources come
//! along in the copy, which keeps the output self-contained even when the
//! source document is discarded.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{Error, Result};
use crate::layout::{self, CropRegion, OutputSpec, PageGeometry};
use crate::marks::registration_mark_lines;
use crate::raster::TileOptions;
use crate::source::pdf::inherited_media_box;
use crate::source::PageSource;

/// Write the tiled poster to `path` by embedding the source's vector content
///
/// Fails with a source format error when the source has no vector content;
/// callers that want an unconditional path should go through the dispatcher,
/// which falls back to rasterizing.
pub fn render(
    path: &Path,
    geometry: &PageGeometry,
    source: &dyn PageSource,
    crop: &CropRegion,
    output: &OutputSpec,
    options: &TileOptions,
) -> Result<()> {
    crop.validate()?;
    output.validate()?;

    let vector = source
        .vector_content()
        .ok_or_else(|| Error::source_format("source has no vector content to embed"))?;
    let src = Document::load_mem(vector.bytes)
        .map_err(|e| Error::source_format(format!("failed to load PDF: {e}")))?;
    if src.is_encrypted() {
        return Err(Error::source_format("PDF is encrypted"));
    }

    let pages = src.get_pages();
    let page_id = *pages
        .get(&(vector.page_index + 1))
        .ok_or_else(|| Error::source_format(format!("no page {}", vector.page_index)))?;

    let mut dst = Document::with_version("1.5");
    let form_id = import_page_as_form(&src, &mut dst, page_id)?;

    let (tiles_x, tiles_y) = layout::tile_count(output, geometry.printable_area())?;
    debug!(tiles_x, tiles_y, "assembling vector tiles");

    let pages_id = dst.new_object_id();
    let mut kids = Vec::with_capacity(tiles_x as usize * tiles_y as usize);

    for tile in layout::tiles(tiles_x, tiles_y) {
        let transform = layout::tile_transform_pdf(tile, crop, output, geometry);
        if !transform.is_axis_aligned() {
            return Err(Error::geometry(format!(
                "tile ({}, {}) transform is not a translate + scale",
                tile.x, tile.y
            )));
        }

        let content = sheet_content(&transform, geometry, options);
        let content_id = dst.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page = dst.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                real(0.0), real(0.0),
                real(geometry.width), real(geometry.height),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Fm0" => form_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page));
    }

    let kid_count = kids.len() as i64;
    dst.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => kid_count,
        }),
    );
    let catalog_id = dst.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    dst.trailer.set("Root", catalog_id);

    dst.save(path)?;
    Ok(())
}

/// Content stream for one sheet: the placed form, then the margin mask,
/// then the registration marks, all in bottom-left page coordinates
fn sheet_content(
    transform: &crate::geom::Matrix,
    geometry: &PageGeometry,
    options: &TileOptions,
) -> Content {
    let mut operations = Vec::new();

    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new(
        "cm",
        transform.coefficients().iter().map(|&v| real(v)).collect(),
    ));
    operations.push(Operation::new("Do", vec!["Fm0".into()]));
    operations.push(Operation::new("Q", vec![]));

    if options.trim {
        // Paint the margins back to white so content spilling past the
        // printable area does not appear twice across adjacent sheets
        let w = geometry.width;
        let h = geometry.height;
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "rg",
            vec![real(1.0), real(1.0), real(1.0)],
        ));
        for [x, y, bw, bh] in [
            [0.0, 0.0, geometry.margin_left, h],
            [w - geometry.margin_right, 0.0, geometry.margin_right, h],
            [0.0, 0.0, w, geometry.margin_bottom],
            [0.0, h - geometry.margin_top, w, geometry.margin_top],
        ] {
            operations.push(Operation::new(
                "re",
                vec![real(x), real(y), real(bw), real(bh)],
            ));
            operations.push(Operation::new("f", vec![]));
        }
        operations.push(Operation::new("Q", vec![]));
    }

    if options.registration_marks {
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new("w", vec![real(1.0)]));
        operations.push(Operation::new("G", vec![real(0.0)]));
        for line in registration_mark_lines(geometry) {
            // The mark math is in top-left coordinates; flip y here
            operations.push(Operation::new(
                "m",
                vec![real(line.x1), real(geometry.height - line.y1)],
            ));
            operations.push(Operation::new(
                "l",
                vec![real(line.x2), real(geometry.height - line.y2)],
            ));
            operations.push(Operation::new("S", vec![]));
        }
        operations.push(Operation::new("Q", vec![]));
    }

    Content { operations }
}

/// Copy one page of `src` into `dst` as a Form XObject
///
/// The page's content streams become the form's payload and its resource
/// dictionary is imported wholesale, including everything it references.
/// The form's matrix cancels any non-zero MediaBox origin so the content
/// lands at the form's own origin.
fn import_page_as_form(src: &Document, dst: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
    let media_box = inherited_media_box(src, page_id)?;
    let payload = src.get_page_content(page_id)?;

    let page_dict = src.get_object(page_id)?.as_dict()?;
    let resources = match page_dict.get(b"Resources") {
        Ok(obj) => {
            let mut map = BTreeMap::new();
            import_object(src, dst, obj, &mut map)?
        }
        Err(_) => Object::Dictionary(Dictionary::new()),
    };

    let form_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "FormType" => 1,
        "BBox" => vec![
            real(media_box[0]), real(media_box[1]),
            real(media_box[2]), real(media_box[3]),
        ],
        "Matrix" => vec![
            real(1.0), real(0.0), real(0.0),
            real(1.0), real(-media_box[0]), real(-media_box[1]),
        ],
        "Resources" => resources,
    };
    Ok(dst.add_object(Stream::new(form_dict, payload)))
}

/// Deep-copy an object graph from `src` into `dst`
///
/// `map` tracks already-copied indirect objects. A reference is entered
/// into the map before its target is copied, so reference cycles (page
/// trees, structure trees) terminate.
fn import_object(
    src: &Document,
    dst: &mut Document,
    object: &Object,
    map: &mut BTreeMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match object {
        Object::Reference(id) => {
            if let Some(new_id) = map.get(id) {
                return Ok(Object::Reference(*new_id));
            }
            let new_id = dst.new_object_id();
            map.insert(*id, new_id);
            let copied = import_object(src, dst, src.get_object(*id)?, map)?;
            dst.objects.insert(new_id, copied);
            Ok(Object::Reference(new_id))
        }
        Object::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(import_object(src, dst, item, map)?);
            }
            Ok(Object::Array(out))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(import_dictionary(src, dst, dict, map)?)),
        Object::Stream(stream) => {
            let dict = import_dictionary(src, dst, &stream.dict, map)?;
            Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
        }
        other => Ok(other.clone()),
    }
}

fn import_dictionary(
    src: &Document,
    dst: &mut Document,
    dict: &Dictionary,
    map: &mut BTreeMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut out = Dictionary::new();
    for (key, value) in dict.iter() {
        out.set(key.clone(), import_object(src, dst, value, map)?);
    }
    Ok(out)
}

#[allow(clippy::cast_possible_truncation)]
fn real(v: f64) -> Object {
    Object::Real(v as f32)
}
