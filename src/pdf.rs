use std::io::BufWriter;
use std::mem;

use lopdf::Object;

use crate::error::ContextError;

/// This struct represents the PDF document on a high-level. It is an interface to the actual
/// underlying `lopdf::Document` which exposes exactly the capability surface the finishing
/// passes need: enumerating pages, swapping content streams, allocating indirect references,
/// touching the page boxes, the info dictionary, the viewer preferences and the catalog.
///
/// All knowledge of the low-level object storage lives here; the finishing passes direct this
/// struct and never reach into `lopdf` themselves. The low-level document is still exposed to
/// the end user for the cases where an escape hatch is strictly necessary.
pub struct PdfDocument {
    /// The underlying PDF document: this is a low-level interface and shouldn't be directly
    /// interacted with unless strictly necessary, anyway this is why it is exposed to the user.
    pub inner_document: lopdf::Document,
}

impl PdfDocument {
    /// Loads a freshly rendered PDF from its raw bytes and decompresses the content streams
    /// once, so that every later pass works on decoded stream text.
    pub fn from_bytes(bytes: &[u8]) -> Result<PdfDocument, ContextError> {
        let mut inner_document = lopdf::Document::load_mem(bytes).map_err(|error| {
            ContextError::with_error("Failed to parse the rendered PDF document", &error)
        })?;
        inner_document.decompress();

        Ok(PdfDocument { inner_document })
    }

    /// The object IDs of the document pages, in page order.
    pub fn page_ids(&self) -> Vec<lopdf::ObjectId> {
        self.inner_document.get_pages().into_values().collect()
    }

    /// Retrieves the decoded content stream of the given page as one byte sequence.
    pub fn page_content(&self, page_id: lopdf::ObjectId) -> Result<Vec<u8>, ContextError> {
        self.inner_document.get_page_content(page_id).map_err(|error| {
            ContextError::with_error(
                format!("Failed to read the content stream of page {:?}", page_id),
                &error,
            )
        })
    }

    /// Replaces the content stream of the given page with the given decoded stream text.
    pub fn set_page_content(
        &mut self,
        page_id: lopdf::ObjectId,
        content: Vec<u8>,
    ) -> Result<(), ContextError> {
        self.inner_document
            .change_page_content(page_id, content)
            .map_err(|error| {
                ContextError::with_error(
                    format!("Failed to replace the content stream of page {:?}", page_id),
                    &error,
                )
            })
    }

    /// Allocates a fresh indirect reference. The object behind it is assigned later through
    /// `set_object`, which lets linked structures be wired up before they are written.
    pub fn allocate_object_id(&mut self) -> lopdf::ObjectId {
        self.inner_document.new_object_id()
    }

    /// Assigns the given object at a previously allocated indirect reference.
    pub fn set_object(&mut self, object_id: lopdf::ObjectId, object: Object) {
        self.inner_document.objects.insert(object_id, object);
    }

    /// Sets an entry of the document catalog, such as the `Outlines` hook of the bookmark tree.
    pub fn set_catalog_entry(&mut self, key: &str, value: Object) -> Result<(), ContextError> {
        self.catalog_mut()?.set(key, value);
        Ok(())
    }

    /// Sets one of the page box rectangles (`MediaBox`, `BleedBox`, `TrimBox`) of the given
    /// page. The rectangle is taken as origin plus extent and written in the lower-left /
    /// upper-right corner form the PDF specification expects.
    pub fn set_page_box(
        &mut self,
        page_id: lopdf::ObjectId,
        box_key: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ContextError> {
        let page_dictionary = self
            .inner_document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|error| {
                ContextError::with_error(
                    format!("Failed to find the page {:?} for setting its boxes", page_id),
                    &error,
                )
            })?;
        page_dictionary.set(
            box_key,
            Object::Array(vec![
                Object::Real(x as f32),
                Object::Real(y as f32),
                Object::Real((x + width) as f32),
                Object::Real((y + height) as f32),
            ]),
        );

        Ok(())
    }

    /// The height of the given page as declared by its effective `MediaBox`, following the
    /// inheritance chain through the page tree when the page itself carries no box.
    pub fn page_height(&self, page_id: lopdf::ObjectId) -> Result<f64, ContextError> {
        let media_box = self
            .inherited_page_entry(page_id, b"MediaBox")
            .ok_or(ContextError::with_context(format!(
                "Failed to find a MediaBox for page {:?}",
                page_id
            )))?;
        let media_box = match media_box {
            // The box itself may be stored behind an indirect reference
            Object::Reference(reference) => {
                self.inner_document.get_object(*reference).map_err(|error| {
                    ContextError::with_error("Failed to resolve the MediaBox reference", &error)
                })?
            }
            other => other,
        };
        let corners = media_box.as_array().map_err(|error| {
            ContextError::with_error("The MediaBox of the page is not a rectangle", &error)
        })?;
        match (
            corners.get(1).and_then(object_to_f64),
            corners.get(3).and_then(object_to_f64),
        ) {
            (Some(lower), Some(upper)) => Ok(upper - lower),
            _ => Err(ContextError::with_context(
                "The MediaBox of the page does not hold four numbers",
            )),
        }
    }

    /// Removes the last page of the document: the page is unlinked from its `Kids` array, the
    /// `Count` of every ancestor of the page tree is decremented, and the page object together
    /// with its content stream objects is dropped from the object storage.
    pub fn remove_last_page(&mut self) -> Result<(), ContextError> {
        let page_id = self
            .page_ids()
            .last()
            .copied()
            .ok_or(ContextError::with_context(
                "Failed to remove the last page of a document without pages",
            ))?;

        // Collect the parent and the content stream references before mutating anything
        let (parent_id, content_ids) = {
            let page_dictionary =
                self.inner_document.get_dictionary(page_id).map_err(|error| {
                    ContextError::with_error(
                        format!("Failed to find the page {:?} to remove", page_id),
                        &error,
                    )
                })?;
            let parent_id = page_dictionary
                .get(b"Parent")
                .and_then(Object::as_reference)
                .map_err(|error| {
                    ContextError::with_error(
                        "Failed to find the parent of the page to remove",
                        &error,
                    )
                })?;
            let content_ids = match page_dictionary.get(b"Contents") {
                Ok(Object::Reference(reference)) => vec![*reference],
                Ok(Object::Array(streams)) => streams
                    .iter()
                    .filter_map(|stream| stream.as_reference().ok())
                    .collect(),
                _ => Vec::new(),
            };
            (parent_id, content_ids)
        };

        // Unlink the page from the Kids array of its parent
        let parent_dictionary = self
            .inner_document
            .get_object_mut(parent_id)
            .and_then(Object::as_dict_mut)
            .map_err(|error| {
                ContextError::with_error("Failed to open the parent of the page to remove", &error)
            })?;
        if let Ok(kids) = parent_dictionary.get_mut(b"Kids").and_then(Object::as_array_mut) {
            kids.retain(|kid| kid.as_reference().map(|id| id != page_id).unwrap_or(true));
        }

        // Every ancestor of the page tree counts the removed leaf
        let mut current_id = Some(parent_id);
        while let Some(node_id) = current_id {
            let node_dictionary = self
                .inner_document
                .get_object_mut(node_id)
                .and_then(Object::as_dict_mut)
                .map_err(|error| {
                    ContextError::with_error(
                        "Failed to walk the page tree of the page to remove",
                        &error,
                    )
                })?;
            if let Ok(count) = node_dictionary.get(b"Count").and_then(Object::as_i64) {
                node_dictionary.set("Count", Object::Integer(count - 1));
            }
            current_id = node_dictionary
                .get(b"Parent")
                .and_then(Object::as_reference)
                .ok();
        }

        self.inner_document.objects.remove(&page_id);
        for content_id in content_ids {
            self.inner_document.objects.remove(&content_id);
        }
        log::debug!("Removed the spurious trailing page {:?}", page_id);

        Ok(())
    }

    /// Sets an entry of the document info dictionary, creating the dictionary and its trailer
    /// reference when the document carries none.
    pub fn set_info_entry(&mut self, key: &str, value: Object) -> Result<(), ContextError> {
        let info_id = match self
            .inner_document
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
        {
            Ok(reference) => reference,
            Err(_) => {
                let reference = self.inner_document.add_object(lopdf::Dictionary::new());
                self.inner_document
                    .trailer
                    .set("Info", Object::Reference(reference));
                reference
            }
        };
        let info_dictionary = self
            .inner_document
            .get_object_mut(info_id)
            .and_then(Object::as_dict_mut)
            .map_err(|error| {
                ContextError::with_error("Failed to open the document info dictionary", &error)
            })?;
        info_dictionary.set(key, value);

        Ok(())
    }

    /// Sets the reading direction of the viewer preferences to right-to-left, creating the
    /// preferences dictionary if the catalog carries none.
    pub fn set_reading_direction_right_to_left(&mut self) -> Result<(), ContextError> {
        // The preferences may be stored inline in the catalog or behind a reference
        let preferences_reference = match self.catalog()?.get(b"ViewerPreferences") {
            Ok(Object::Reference(reference)) => Some(*reference),
            _ => None,
        };

        let preferences = match preferences_reference {
            Some(reference) => self
                .inner_document
                .get_object_mut(reference)
                .and_then(Object::as_dict_mut)
                .map_err(|error| {
                    ContextError::with_error("Failed to open the viewer preferences", &error)
                })?,
            None => {
                let catalog = self.catalog_mut()?;
                if !matches!(catalog.get(b"ViewerPreferences"), Ok(Object::Dictionary(_))) {
                    catalog.set("ViewerPreferences", Object::Dictionary(lopdf::Dictionary::new()));
                }
                catalog
                    .get_mut(b"ViewerPreferences")
                    .and_then(Object::as_dict_mut)
                    .map_err(|error| {
                        ContextError::with_error("Failed to open the viewer preferences", &error)
                    })?
            }
        };
        preferences.set("Direction", Object::Name(b"R2L".to_vec()));

        Ok(())
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file or further processed.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, ContextError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ContextError::with_error("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    /// The document catalog, located through the `Root` entry of the trailer.
    fn catalog(&self) -> Result<&lopdf::Dictionary, ContextError> {
        self.inner_document.catalog().map_err(|error| {
            ContextError::with_error("Failed to locate the document catalog", &error)
        })
    }

    /// The document catalog as a mutable dictionary.
    fn catalog_mut(&mut self) -> Result<&mut lopdf::Dictionary, ContextError> {
        let catalog_id = self
            .inner_document
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|error| {
                ContextError::with_error("Failed to locate the document catalog", &error)
            })?;
        self.inner_document
            .get_object_mut(catalog_id)
            .and_then(Object::as_dict_mut)
            .map_err(|error| {
                ContextError::with_error("Failed to open the document catalog", &error)
            })
    }

    /// Looks up a page attribute, walking up the `Parent` chain of the page tree when the page
    /// itself does not carry it, as the PDF specification allows for the inheritable keys.
    fn inherited_page_entry(&self, page_id: lopdf::ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current_id = Some(page_id);
        while let Some(node_id) = current_id {
            let node_dictionary = self.inner_document.get_dictionary(node_id).ok()?;
            if let Ok(object) = node_dictionary.get(key) {
                return Some(object);
            }
            current_id = node_dictionary
                .get(b"Parent")
                .and_then(Object::as_reference)
                .ok();
        }

        None
    }
}

/// Reads a numeric PDF object as an `f64`, accepting both integer and real representations.
fn object_to_f64(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}
