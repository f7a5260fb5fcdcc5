use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, Schema, TantivyDocument, TextFieldIndexing,
    TextOptions, Value, STORED,
};
use tantivy::tokenizer::{LowerCaser, TextAnalyzer, WhitespaceTokenizer};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};

const TOKENIZER: &str = "whitespace_lower";

/// In-memory BM25 index over one text per unit position.
///
/// Whitespace tokens, lowercased, no stemming or stop-words.
pub struct LexicalIndex {
    reader: IndexReader,
    f_text: Field,
    f_position: Field,
    len: usize,
}

impl LexicalIndex {
    /// Index `texts`; document `i` is unit position `i`.
    pub fn build(texts: &[String]) -> tantivy::Result<Self> {
        let mut schema_builder = Schema::builder();
        let indexing = TextFieldIndexing::default()
            .set_tokenizer(TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqs);
        let f_text =
            schema_builder.add_text_field("text", TextOptions::default().set_indexing_options(indexing));
        let f_position =
            schema_builder.add_u64_field("position", NumericOptions::default() | STORED);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        index.tokenizers().register(
            TOKENIZER,
            TextAnalyzer::builder(WhitespaceTokenizer::default())
                .filter(LowerCaser)
                .build(),
        );

        let mut writer: IndexWriter = index.writer(50_000_000)?;
        for (position, text) in texts.iter().enumerate() {
            writer.add_document(doc!(
                f_text => text.clone(),
                f_position => position as u64,
            ))?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            reader,
            f_text,
            f_position,
            len: texts.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// BM25 score of every position against `tokens`; unmatched positions score 0.
    ///
    /// Tokens must already be lowercased whitespace tokens.
    pub fn scores(&self, tokens: &[String]) -> tantivy::Result<Vec<f32>> {
        let mut scores = vec![0.0f32; self.len];
        if tokens.is_empty() || self.len == 0 {
            return Ok(scores);
        }

        let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
            .iter()
            .map(|token| {
                let term = Term::from_field_text(self.f_text, token);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(self.len))?;

        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let position = doc
                .get_first(self.f_position)
                .and_then(|v| v.as_u64())
                .map(|p| p as usize);

            match position {
                Some(p) if p < self.len => scores[p] = score,
                _ => tracing::warn!("Lexical hit without a valid position, skipping"),
            }
        }

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn tokens(query: &str) -> Vec<String> {
        query.split_whitespace().map(|t| t.to_lowercase()).collect()
    }

    #[test]
    fn test_scores_align_with_positions() {
        let index = LexicalIndex::build(&texts(&[
            "parse json config",
            "delete items from list",
            "render html template",
        ]))
        .unwrap();
        assert_eq!(index.len(), 3);

        let scores = index.scores(&tokens("delete")).unwrap();
        assert_eq!(scores.len(), 3);
        assert!(scores[1] > 0.0);
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let index = LexicalIndex::build(&texts(&["Fetch Items", "store Items"])).unwrap();
        let lower = index.scores(&tokens("fetch")).unwrap();
        let upper = index.scores(&tokens("FETCH")).unwrap();
        assert_eq!(lower, upper);
        assert!(lower[0] > 0.0);
    }

    #[test]
    fn test_no_stemming() {
        let index = LexicalIndex::build(&texts(&["deleting rows", "delete rows"])).unwrap();
        let scores = index.scores(&tokens("delete")).unwrap();
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn test_more_occurrences_score_higher() {
        let index = LexicalIndex::build(&texts(&[
            "cache cache cache lookup",
            "cache lookup table here",
        ]))
        .unwrap();
        let scores = index.scores(&tokens("cache")).unwrap();
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn test_empty_tokens_score_zero() {
        let index = LexicalIndex::build(&texts(&["anything at all"])).unwrap();
        assert_eq!(index.scores(&[]).unwrap(), vec![0.0]);
    }
}
