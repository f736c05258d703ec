// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use libfuzzer_sys::fuzz_target;
use postcraft_core::markup::serialize;
use postcraft_core::{DocumentModel, ParseConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for config in [ParseConfig::default(), ParseConfig::lenient()] {
        let mut model = DocumentModel::new();
        model.load_from(input, &config);

        let markup = serialize(model.document());
        assert_eq!(markup, serialize(model.document()));
        let _ = model.to_render_tree().to_html();
    }
});
