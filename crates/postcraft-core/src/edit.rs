// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editing primitives
//!
//! Each function mutates a working copy of the document and selection and
//! returns whether it did anything. The model decides whether the result
//! becomes a history step.

use crate::ast::{Alignment, Block, BlockType, Document, Mark, MarkSet};
use crate::selection::{Position, Selection};
use unicode_segmentation::UnicodeSegmentation;

/// Add `mark` across the selection, or remove it when every selected
/// character already carries it
pub(crate) fn toggle_mark(doc: &mut Document, sel: &Selection, mark: Mark) -> bool {
    let ranges: Vec<_> = sel
        .block_ranges(doc)
        .into_iter()
        .filter(|(index, start, end)| start < end && doc.blocks()[*index].content().is_some())
        .collect();
    if ranges.is_empty() {
        return false;
    }

    let fully_marked = ranges.iter().all(|(index, start, end)| {
        doc.blocks()[*index]
            .spans_in(*start, *end)
            .iter()
            .all(|span| span.marks.contains(mark))
    });

    for (index, start, end) in ranges {
        doc.blocks_mut()[index].format_range(start, end, |span| {
            if fully_marked {
                span.marks.remove(mark);
            } else {
                span.marks.insert(mark);
            }
        });
    }
    true
}

/// Switch every selected block to `target`
pub(crate) fn set_block_type(doc: &mut Document, sel: &mut Selection, target: BlockType) -> bool {
    let first = sel.start().block;
    let last = sel.end().block.min(doc.len().saturating_sub(1));

    let mut replaced = Vec::new();
    let mut changed = false;
    for block in &doc.blocks()[first..=last] {
        match block.block_type() {
            Some(current) if current != target => {
                changed = true;
                replaced.extend(block.convert(target));
            }
            _ => replaced.push(block.clone()),
        }
    }
    if !changed {
        return false;
    }

    let count = replaced.len();
    let _: Vec<Block> = doc.blocks_mut().splice(first..=last, replaced).collect();
    if count != last - first + 1 {
        let end = first + count - 1;
        let end_offset = doc.block(end).map(Block::char_len).unwrap_or(0);
        *sel = Selection::new(Position::new(first, 0), Position::new(end, end_offset));
    }
    *sel = sel.clamp(doc);
    true
}

pub(crate) fn set_alignment(doc: &mut Document, sel: &Selection, alignment: Alignment) -> bool {
    let first = sel.start().block;
    let last = sel.end().block;
    let mut changed = false;
    for block in doc.blocks_mut().iter_mut().take(last + 1).skip(first) {
        changed |= block.set_alignment(alignment);
    }
    changed
}

/// Link the selection to `href`
///
/// A collapsed cursor inside a link retargets that link; elsewhere the href
/// itself is inserted as linked text.
pub(crate) fn insert_link(doc: &mut Document, sel: &mut Selection, href: &str, marks: MarkSet) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return false;
    }

    if !sel.is_collapsed() {
        let mut linked = false;
        for (index, start, end) in sel.block_ranges(doc) {
            let block = &mut doc.blocks_mut()[index];
            if start < end && block.content().is_some() {
                block.format_range(start, end, |span| span.link = Some(href.to_string()));
                linked = true;
            }
        }
        return linked;
    }

    let cursor = sel.head;
    let block = &mut doc.blocks_mut()[cursor.block];
    if block.content().is_none() {
        return false;
    }
    match block.link_extent(cursor.offset) {
        Some((start, end)) => {
            block.format_range(start, end, |span| span.link = Some(href.to_string()));
        }
        None => {
            block.insert_text(cursor.offset, href, marks, Some(href.to_string()));
            let offset = cursor.offset + href.chars().count();
            *sel = Selection::caret(Position::new(cursor.block, offset));
        }
    }
    true
}

pub(crate) fn remove_link(doc: &mut Document, sel: &Selection) -> bool {
    let ranges = if sel.is_collapsed() {
        let cursor = sel.head;
        match doc.blocks()[cursor.block].link_extent(cursor.offset) {
            Some((start, end)) => vec![(cursor.block, start, end)],
            None => return false,
        }
    } else {
        sel.block_ranges(doc)
    };

    let mut changed = false;
    for (index, start, end) in ranges {
        let block = &mut doc.blocks_mut()[index];
        if block.spans_in(start, end).iter().any(|span| span.link.is_some()) {
            block.format_range(start, end, |span| span.link = None);
            changed = true;
        }
    }
    changed
}

/// Delete the selected range, leaving a caret at its start
pub(crate) fn delete_selection(doc: &mut Document, sel: &mut Selection) -> bool {
    if sel.is_collapsed() {
        return false;
    }
    let start = sel.start();
    let end = sel.end();

    if start.block == end.block {
        doc.blocks_mut()[start.block].delete_range(start.offset, end.offset);
    } else {
        let blocks = doc.blocks_mut();
        let first_len = blocks[start.block].char_len();
        blocks[start.block].delete_range(start.offset, first_len);
        blocks[end.block].delete_range(0, end.offset);
        let removed: Vec<Block> = blocks.drain(start.block + 1..=end.block).collect();
        if let Some(tail) = removed.into_iter().last() {
            if blocks[start.block].is_rule() {
                if !tail.is_rule() {
                    blocks[start.block] = tail;
                }
            } else if !tail.is_rule() {
                blocks[start.block].append(tail);
            }
        }
    }

    doc.ensure_not_empty();
    *sel = Selection::caret(start).clamp(doc);
    true
}

/// Insert typed text at the caret, replacing any selection
///
/// Newlines split text blocks; inside code blocks they are kept verbatim.
pub(crate) fn insert_text(doc: &mut Document, sel: &mut Selection, text: &str, marks: MarkSet) -> bool {
    if text.is_empty() {
        return false;
    }
    delete_selection(doc, sel);

    let mut cursor = sel.head;
    if doc.blocks()[cursor.block].is_rule() {
        doc.blocks_mut()
            .insert(cursor.block + 1, Block::empty_paragraph());
        cursor = Position::new(cursor.block + 1, 0);
    }

    if doc.blocks()[cursor.block].is_code() {
        doc.blocks_mut()[cursor.block].insert_text(cursor.offset, text, MarkSet::empty(), None);
        cursor.offset += text.chars().count();
        *sel = Selection::caret(cursor);
        return true;
    }

    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            let mut caret = Selection::caret(cursor);
            split_block(doc, &mut caret);
            cursor = caret.head;
        }
        if line.is_empty() {
            continue;
        }
        let block = &mut doc.blocks_mut()[cursor.block];
        let link = inherited_link(block, cursor.offset);
        block.insert_text(cursor.offset, line, marks, link);
        cursor.offset += line.chars().count();
    }

    *sel = Selection::caret(cursor);
    true
}

/// Link carried over to text typed at `offset`: only when typing strictly
/// inside a link, never at its edges
fn inherited_link(block: &Block, offset: usize) -> Option<String> {
    let before = block.link_at(offset.checked_sub(1)?)?;
    let after = block.link_at(offset)?;
    (before == after).then(|| before.to_string())
}

/// Backspace
pub(crate) fn delete_backward(doc: &mut Document, sel: &mut Selection) -> bool {
    if delete_selection(doc, sel) {
        return true;
    }
    let cursor = sel.head;

    if cursor.offset > 0 {
        let block = &mut doc.blocks_mut()[cursor.block];
        let text = block.text();
        let width = previous_grapheme_width(&text, cursor.offset);
        block.delete_range(cursor.offset - width, cursor.offset);
        *sel = Selection::caret(Position::new(cursor.block, cursor.offset - width));
        return true;
    }

    let current = &doc.blocks()[cursor.block];
    if current.is_rule() {
        if doc.len() == 1 {
            doc.blocks_mut()[0] = Block::empty_paragraph();
        } else {
            doc.blocks_mut().remove(cursor.block);
        }
        let target = cursor.block.saturating_sub(1);
        let offset = if cursor.block > 0 {
            doc.block(target).map(Block::char_len).unwrap_or(0)
        } else {
            0
        };
        *sel = Selection::caret(Position::new(target, offset)).clamp(doc);
        return true;
    }

    // Leaving a structured block at its start lifts it to a paragraph first
    if current.block_type() != Some(BlockType::Paragraph) {
        let mut lift = Selection::caret(cursor);
        set_block_type(doc, &mut lift, BlockType::Paragraph);
        *sel = Selection::caret(cursor).clamp(doc);
        return true;
    }

    if cursor.block == 0 {
        return false;
    }

    let previous = cursor.block - 1;
    if doc.blocks()[previous].is_rule() {
        doc.blocks_mut().remove(previous);
        *sel = Selection::caret(Position::new(previous, 0));
        return true;
    }

    let join_at = doc.blocks()[previous].char_len();
    let current = doc.blocks_mut().remove(cursor.block);
    doc.blocks_mut()[previous].append(current);
    *sel = Selection::caret(Position::new(previous, join_at));
    true
}

fn previous_grapheme_width(text: &str, offset: usize) -> usize {
    let prefix: String = text.chars().take(offset).collect();
    prefix
        .graphemes(true)
        .next_back()
        .map(|g| g.chars().count())
        .unwrap_or(1)
}

/// Enter
pub(crate) fn split_block(doc: &mut Document, sel: &mut Selection) -> bool {
    delete_selection(doc, sel);
    let cursor = sel.head;
    let block = &doc.blocks()[cursor.block];

    if block.is_code() {
        doc.blocks_mut()[cursor.block].insert_text(cursor.offset, "\n", MarkSet::empty(), None);
        *sel = Selection::caret(Position::new(cursor.block, cursor.offset + 1));
        return true;
    }

    if block.is_rule() {
        doc.blocks_mut()
            .insert(cursor.block + 1, Block::empty_paragraph());
        *sel = Selection::caret(Position::new(cursor.block + 1, 0));
        return true;
    }

    // Enter on an empty list item or quote line leaves the container
    if block.is_empty()
        && matches!(block, Block::ListItem { .. } | Block::BlockQuote { .. })
    {
        doc.blocks_mut()[cursor.block] = Block::empty_paragraph();
        return true;
    }

    let at_end = cursor.offset >= block.char_len();
    let heading_alignment = match block {
        Block::Heading { alignment, .. } if at_end => Some(*alignment),
        _ => None,
    };

    let mut tail = doc.blocks_mut()[cursor.block].split_off(cursor.offset);
    if let Some(alignment) = heading_alignment {
        tail = Block::of_type(BlockType::Paragraph, Vec::new(), alignment);
    }
    doc.blocks_mut().insert(cursor.block + 1, tail);
    *sel = Selection::caret(Position::new(cursor.block + 1, 0));
    true
}

pub(crate) fn insert_horizontal_rule(doc: &mut Document, sel: &mut Selection) -> bool {
    delete_selection(doc, sel);
    let cursor = sel.head;
    let block = &doc.blocks()[cursor.block];

    if block.block_type() == Some(BlockType::Paragraph) && block.is_empty() {
        let blocks = doc.blocks_mut();
        blocks[cursor.block] = Block::HorizontalRule;
        blocks.insert(cursor.block + 1, Block::empty_paragraph());
        *sel = Selection::caret(Position::new(cursor.block + 1, 0));
        return true;
    }

    if cursor.offset == 0 && !block.is_rule() {
        doc.blocks_mut().insert(cursor.block, Block::HorizontalRule);
        *sel = Selection::caret(Position::new(cursor.block + 1, 0));
        return true;
    }

    let tail = if cursor.offset >= block.char_len() {
        Block::empty_paragraph()
    } else {
        doc.blocks_mut()[cursor.block].split_off(cursor.offset)
    };
    let blocks = doc.blocks_mut();
    blocks.insert(cursor.block + 1, Block::HorizontalRule);
    blocks.insert(cursor.block + 2, tail);
    *sel = Selection::caret(Position::new(cursor.block + 2, 0));
    true
}

/// Leading run of `[A-Za-z0-9_+#.-]`, safe in a fence line and a class name
fn code_language_token(language: &str) -> Option<String> {
    let token: String = language
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '#' | '.' | '-'))
        .collect();
    (!token.is_empty()).then_some(token)
}

pub(crate) fn set_code_language(doc: &mut Document, sel: &Selection, language: Option<&str>) -> bool {
    let language = language.and_then(code_language_token);
    let first = sel.start().block;
    let last = sel.end().block;

    let mut changed = false;
    for block in doc.blocks_mut().iter_mut().take(last + 1).skip(first) {
        if let Block::CodeBlock { language: current, .. } = block {
            if *current != language {
                current.clone_from(&language);
                changed = true;
            }
        }
    }
    changed
}
