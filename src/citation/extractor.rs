use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::citation::resolver::SourceSegment;
use crate::llm::client::types::GroundingChunk;

const FALLBACK_LABEL: &str = "source";

/// 一条引用：支撑文本区间`[start_offset, end_offset)`（字符位置）及其来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub start_offset: usize,
    pub end_offset: usize,
    pub segments: Vec<SourceSegment>,
}

/// 根据grounding元数据生成引用列表，按区间升序排列。
///
/// 区间非法（`end <= start`或越界）以及链接未解析的记录会被丢弃；
/// 相同区间的记录合并为一条引用。
pub fn extract(
    response_text: &str,
    grounding_chunks: &[GroundingChunk],
    resolved: &HashMap<String, String>,
) -> Vec<Citation> {
    let text_len = response_text.chars().count();

    let mut valid: Vec<&GroundingChunk> = grounding_chunks
        .iter()
        .filter(|chunk| chunk.end_offset > chunk.start_offset && chunk.end_offset <= text_len)
        .filter(|chunk| resolved.contains_key(&chunk.source_url))
        .collect();
    valid.sort_by_key(|chunk| (chunk.start_offset, chunk.end_offset));

    let mut citations: Vec<Citation> = Vec::new();
    for chunk in valid {
        let segment = SourceSegment {
            label: label_or_fallback(&chunk.source_label),
            short_key: resolved[&chunk.source_url].clone(),
            long_url: chunk.source_url.clone(),
        };

        match citations.last_mut() {
            Some(last)
                if last.start_offset == chunk.start_offset
                    && last.end_offset == chunk.end_offset =>
            {
                if !last.segments.iter().any(|s| s.short_key == segment.short_key) {
                    last.segments.push(segment);
                }
            }
            _ => citations.push(Citation {
                start_offset: chunk.start_offset,
                end_offset: chunk.end_offset,
                segments: vec![segment],
            }),
        }
    }

    citations
}

/// 在每条引用的结束位置插入`[label](short_key)`标记。
///
/// 按结束位置降序处理，插入只影响其后的文本，未处理引用的偏移保持有效。
pub fn insert_markers(response_text: &str, citations: &[Citation]) -> String {
    let mut ordered: Vec<&Citation> = citations.iter().collect();
    ordered.sort_by(|a, b| {
        (b.end_offset, b.start_offset).cmp(&(a.end_offset, a.start_offset))
    });

    let mut annotated = response_text.to_string();
    for citation in ordered {
        let marker: String = citation
            .segments
            .iter()
            .map(|segment| format!(" [{}]({})", segment.label, segment.short_key))
            .collect();
        // 降序插入时前缀不变，字节位置可直接从原文计算
        let byte_index = char_to_byte_index(response_text, citation.end_offset);
        annotated.insert_str(byte_index, &marker);
    }

    annotated
}

/// 引用中出现的全部来源，保持引用顺序
pub fn collect_segments(citations: &[Citation]) -> Vec<SourceSegment> {
    citations
        .iter()
        .flat_map(|citation| citation.segments.iter().cloned())
        .collect()
}

fn char_to_byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

fn label_or_fallback(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}
