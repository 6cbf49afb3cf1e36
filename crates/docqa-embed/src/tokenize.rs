use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Ids and attention mask for a batch, each `[B, T]` with `T` the longest
/// sequence after truncation to `max_len`. Padding uses id 0 and mask 0.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
        rows.push((ids, mask));
    }
    let seq = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(rows.len() * seq);
    let mut flat_mask = Vec::with_capacity(rows.len() * seq);
    for (mut ids, mut mask) in rows {
        ids.resize(seq, 0);
        mask.resize(seq, 0);
        flat_ids.extend(ids);
        flat_mask.extend(mask);
    }
    let input_ids = Tensor::from_vec(flat_ids, (texts.len(), seq), device)?;
    let attention_mask = Tensor::from_vec(flat_mask, (texts.len(), seq), device)?;
    Ok((input_ids, attention_mask))
}
