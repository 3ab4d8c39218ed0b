//! 文本分割器
//!
//! 将长文本切分为长度受限的片段，供 TTS 逐段合成：
//! 1. 按空行切分段落，贪心合并相邻段落
//! 2. 超长段落按句末标点细分，同样贪心合并句子
//! 3. 单个超长句子不再切分，原样输出

/// 默认单片段最大字符数
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 900;

/// 段落之间的连接符
pub const PARAGRAPH_JOINER: &str = "\n\n";

/// 同一段落内句子之间的连接符
pub const SENTENCE_JOINER: &str = " ";

/// 文本分割配置
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// 单片段最大字符数（按 Unicode 字符计）
    pub max_chars: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

/// 片段与前一个片段之间的连接方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    /// 第一个片段
    None,
    /// 段落边界
    Paragraph,
    /// 同一超长段落内的句子边界
    Sentence,
}

impl Joiner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Joiner::None => "",
            Joiner::Paragraph => PARAGRAPH_JOINER,
            Joiner::Sentence => SENTENCE_JOINER,
        }
    }
}

/// 分割后的文本片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    index: usize,
    text: String,
    joiner: Joiner,
}

impl TextChunk {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn joiner(&self) -> Joiner {
        self.joiner
    }

    pub fn char_count(&self) -> usize {
        char_len(&self.text)
    }
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[inline]
fn is_sentence_terminal(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

/// 片段收集器，负责编号和记录连接符
#[derive(Default)]
struct ChunkSink {
    chunks: Vec<TextChunk>,
}

impl ChunkSink {
    fn push(&mut self, text: String, joiner: Joiner) {
        let joiner = if self.chunks.is_empty() {
            Joiner::None
        } else {
            joiner
        };
        self.chunks.push(TextChunk {
            index: self.chunks.len(),
            text,
            joiner,
        });
    }

    fn flush(&mut self, buffer: &mut String, buffer_len: &mut usize) {
        if !buffer.is_empty() {
            self.push(std::mem::take(buffer), Joiner::Paragraph);
        }
        *buffer_len = 0;
    }
}

/// 按空行切分段落
///
/// 去掉所有 `\r`，两个及以上连续换行视为段落边界，单个换行保留在段落内
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut newlines = 0usize;

    for ch in text.trim().chars().filter(|c| *c != '\r') {
        if ch == '\n' {
            newlines += 1;
            continue;
        }
        if newlines >= 2 {
            paragraphs.push(std::mem::take(&mut current));
        } else if newlines == 1 {
            current.push('\n');
        }
        newlines = 0;
        current.push(ch);
    }
    paragraphs.push(current);

    paragraphs
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// 按句子边界切分段落
///
/// 边界为句末标点之后的连续空白，空白本身被丢弃
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut prev: Option<char> = None;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if ch.is_whitespace() && prev.map_or(false, is_sentence_terminal) {
            sentences.push(&paragraph[start..i]);
            let mut end = i + ch.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = j + next.len_utf8();
                chars.next();
            }
            start = end;
            prev = None;
            continue;
        }
        prev = Some(ch);
    }

    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }

    sentences
}

/// 将超长段落按句子贪心打包
fn pack_sentences(paragraph: &str, max_chars: usize, sink: &mut ChunkSink) {
    let mut buffer = String::new();
    let mut buffer_len = 0usize;
    let mut joiner = Joiner::Paragraph;

    for sentence in split_sentences(paragraph) {
        let sentence_len = char_len(sentence);
        let candidate_len = if buffer.is_empty() {
            sentence_len
        } else {
            buffer_len + SENTENCE_JOINER.len() + sentence_len
        };

        if candidate_len <= max_chars {
            if !buffer.is_empty() {
                buffer.push_str(SENTENCE_JOINER);
            }
            buffer.push_str(sentence);
            buffer_len = candidate_len;
            continue;
        }

        if !buffer.is_empty() {
            sink.push(std::mem::take(&mut buffer), joiner);
            joiner = Joiner::Sentence;
        }
        // 超长句子不再切分，作为独立片段输出
        buffer.push_str(sentence);
        buffer_len = sentence_len;
    }

    if !buffer.is_empty() {
        sink.push(buffer, joiner);
    }
}

/// 对文本进行分段
///
/// 空文本或纯空白文本返回空列表，由调用方决定如何处理
pub fn segment_text(text: &str, config: &SegmentConfig) -> Vec<TextChunk> {
    let max_chars = config.max_chars;
    let mut sink = ChunkSink::default();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for paragraph in split_paragraphs(text) {
        let paragraph_len = char_len(&paragraph);
        let candidate_len = if buffer.is_empty() {
            paragraph_len
        } else {
            buffer_len + PARAGRAPH_JOINER.len() + paragraph_len
        };

        if candidate_len <= max_chars {
            if !buffer.is_empty() {
                buffer.push_str(PARAGRAPH_JOINER);
            }
            buffer.push_str(&paragraph);
            buffer_len = candidate_len;
            continue;
        }

        sink.flush(&mut buffer, &mut buffer_len);

        if paragraph_len > max_chars {
            pack_sentences(&paragraph, max_chars, &mut sink);
            continue;
        }

        buffer = paragraph;
        buffer_len = paragraph_len;
    }

    sink.flush(&mut buffer, &mut buffer_len);
    sink.chunks
}

/// 使用默认配置分段（便捷方法）
pub fn segment_text_default(text: &str) -> Vec<TextChunk> {
    segment_text(text, &SegmentConfig::default())
}

/// 分段前的空白规范化形式
///
/// 段落之间统一为 `\n\n`；超长段落内句子边界处的空白压缩为单个空格
pub fn normalize_whitespace(text: &str, config: &SegmentConfig) -> String {
    split_paragraphs(text)
        .iter()
        .map(|p| {
            if char_len(p) > config.max_chars {
                split_sentences(p).join(SENTENCE_JOINER)
            } else {
                p.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(PARAGRAPH_JOINER)
}

/// 按记录的连接符拼回所有片段
pub fn reassemble(chunks: &[TextChunk]) -> String {
    let mut text = String::new();
    for chunk in chunks {
        text.push_str(chunk.joiner.as_str());
        text.push_str(&chunk.text);
    }
    text
}
