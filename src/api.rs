use crate::config::{Config, Strategy};
use crate::dates::DateParser;
use crate::engine::{
    self, CandidatePool, DocumentMetrics, Extraction, FeatureGroups, Feature, Mode, Reference, Row, Schema,
    TextPosition, TitleTable,
};
use crate::error::{Error, Result};
use crate::labeler::{Labeler, LabeledDocument, TableWriter, WapitiLabeler, read_labeled, render_templates};
use crate::locale::Locale;
use crate::rules::{RuleSet, load_rule_set};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use url::Url;

/// Per-page context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Download or crawl date. Resolved dates never come after it, and dates
    /// without a year borrow its year.
    pub reference: Option<NaiveDate>,
    pub url: Option<Url>,
    /// Locale of the rule tables; generic English is refined from the URL.
    pub locale: Option<Locale>,
}

/// Overrides of the configured resolution settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub strategy: Option<Strategy>,
    pub score_threshold: Option<f64>,
}

/// One page to analyze.
#[derive(Debug, Clone)]
pub struct Page<'a> {
    /// Name written to the feature table, usually the file path.
    pub name: String,
    pub bytes: &'a [u8],
    pub context: Context,
}

impl<'a> Page<'a> {
    pub fn new(name: impl Into<String>, bytes: &'a [u8]) -> Self {
        Self { name: name.into(), bytes, context: Context::default() }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// Title and creation date of a page.
#[derive(Debug, Clone, Default)]
pub struct PageInfo {
    pub title: String,
    pub date: Option<NaiveDate>,
    /// Text the date was read from; empty when the date came from the URL.
    pub date_text: String,
    /// Annotated values, in evaluation mode.
    pub reference: Option<Reference>,
    /// Labeled spans the date was chosen from.
    pub candidates: CandidatePool,
    pub metrics: DocumentMetrics,
}

impl fmt::Display for PageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{}\t{}", date.format("%Y-%m-%d"), self.title),
            None => write!(f, "\t{}", self.title),
        }
    }
}

/// Filtered feature rows of one page, before labeling.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub title: TextPosition,
    pub titles: TitleTable,
    pub rows: Vec<Row>,
    pub reference: Option<Reference>,
    pub metrics: DocumentMetrics,
}

// --- Extractor ---------------------------------------------------------------

/// Feature extraction for one locale. Immutable once built, shared between
/// threads.
#[derive(Debug)]
pub struct Extractor {
    rules: RuleSet,
    config: Config,
}

impl Extractor {
    pub fn new(rules: RuleSet, config: Config) -> Self {
        Self { rules, config }
    }

    /// Load the rule tables of `locale` from the configured data directory.
    pub fn load(config: &Config, locale: &Locale) -> Result<Self> {
        Ok(Self::new(load_rule_set(config, locale)?, config.clone()))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Extract and filter the records of one page.
    pub fn analyze(&self, bytes: &[u8], name: &str, mode: Mode) -> Result<Analysis> {
        let started = Instant::now();
        let Extraction { title, titles, rows, totals, reference, metrics: extraction } =
            engine::extract(&self.rules, &self.config, bytes, name, mode).map_err(|e| e.in_document(name))?;
        let (rows, filter) = engine::filter(rows, &title, &totals, self.config.window_size, !mode.is_train());
        let metrics = DocumentMetrics { total: started.elapsed(), extraction, filter };
        debug!(document = name, kept = metrics.filter.kept, pruned = metrics.filter.pruned, "document analyzed");
        Ok(Analysis { title, titles, rows, reference, metrics })
    }

    /// Date encoded in the URL path, if a URL pattern matches it.
    pub fn url_date(&self, url: &Url) -> Option<NaiveDate> {
        DateParser::new(&self.rules.url_patterns).parse_tokens(&[url.path()], None)
    }
}

// --- Finder ------------------------------------------------------------------

/// Entry point: per-locale extractors plus the external labeler.
pub struct DctFinder {
    config: Config,
    schema: Schema,
    extractors: Mutex<HashMap<Locale, Arc<Extractor>>>,
    labeler: Box<dyn Labeler>,
}

impl fmt::Debug for DctFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DctFinder").field("config", &self.config).field("labeler", &"<labeler>").finish()
    }
}

/// A page after extraction, waiting for its date.
struct Pending {
    extractor: Arc<Extractor>,
    analysis: Analysis,
    reference: Option<NaiveDate>,
    url_date: Option<NaiveDate>,
}

impl DctFinder {
    /// Finder running the Wapiti binary named in the configuration.
    pub fn new(config: Config) -> Self {
        let labeler = Box::new(WapitiLabeler::new(&config.labeler));
        Self::with_labeler(config, labeler)
    }

    pub fn with_labeler(config: Config, labeler: Box<dyn Labeler>) -> Self {
        Self { config, schema: Schema::new(FeatureGroups::all()), extractors: Mutex::new(HashMap::new()), labeler }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extractor of `locale`, loading its rule tables on first use.
    pub fn extractor(&self, locale: &Locale) -> Result<Arc<Extractor>> {
        let mut extractors = self.extractors.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(extractor) = extractors.get(locale) {
            return Ok(Arc::clone(extractor));
        }
        let extractor = Arc::new(Extractor::load(&self.config, locale)?);
        info!(locale = %locale, "extractor ready");
        extractors.insert(locale.clone(), Arc::clone(&extractor));
        Ok(extractor)
    }

    fn extractor_for(&self, context: &Context) -> Result<Arc<Extractor>> {
        let locale = context.locale.clone().unwrap_or_default().refine(context.url.as_ref());
        self.extractor(&locale)
    }

    fn mode(&self) -> Mode {
        if self.config.eval_mode { Mode::Eval } else { Mode::Label }
    }

    /// Filtered feature rows of one page, without labeling.
    pub fn features(&self, page: &Page<'_>) -> Result<Analysis> {
        self.extractor_for(&page.context)?.analyze(page.bytes, &page.name, self.mode())
    }

    /// Write the feature table of `pages` to `out`, as the labeler would see it.
    pub fn write_features<W: Write>(&self, pages: &[Page<'_>], out: W) -> Result<W> {
        let mut writer = TableWriter::new(out, self.schema);
        for page in pages {
            writer.write_rows(&self.features(page)?.rows)?;
        }
        writer.finish()
    }

    pub fn page_info(&self, page: &Page<'_>, options: &Options) -> Result<PageInfo> {
        let mut infos = self.page_infos(std::slice::from_ref(page), options)?;
        infos.pop().ok_or_else(|| Error::format("labeler output is missing the page"))
    }

    /// Title and date of each page, in order. Pages dated by their URL skip
    /// the labeler; all the others share one labeler run.
    pub fn page_infos(&self, pages: &[Page<'_>], options: &Options) -> Result<Vec<PageInfo>> {
        let mode = self.mode();
        let mut pending = Vec::with_capacity(pages.len());
        for page in pages {
            let extractor = self.extractor_for(&page.context)?;
            let analysis = extractor.analyze(page.bytes, &page.name, mode)?;
            let url_date = page.context.url.as_ref().and_then(|url| extractor.url_date(url));
            if let Some(date) = url_date {
                debug!(document = %page.name, %date, "dated by URL");
            }
            pending.push(Pending { extractor, analysis, reference: page.context.reference, url_date });
        }

        let to_label: Vec<&Pending> = pending.iter().filter(|p| p.url_date.is_none()).collect();
        let mut labeled = self.label(&to_label, options)?.into_iter();

        let strategy = options.strategy.unwrap_or(self.config.strategy);
        let mut infos = Vec::with_capacity(pending.len());
        for page in pending {
            let mut info = PageInfo {
                title: page.analysis.title.text.trim().to_string(),
                reference: page.analysis.reference,
                metrics: page.analysis.metrics,
                ..PageInfo::default()
            };
            if let Some(date) = page.url_date {
                info.date = Some(date);
            } else {
                let pool = labeled.next().map(|doc| doc.pool).unwrap_or_default();
                let parser = DateParser::new(&page.extractor.rules.date_patterns);
                if let Some(resolution) = engine::resolve(strategy, &parser, &pool, page.reference) {
                    info.date = Some(resolution.date);
                    info.date_text = resolution.text;
                }
                info.candidates = pool;
            }
            infos.push(info);
        }
        Ok(infos)
    }

    /// Run the labeler once over the rows of `pages` and split its output
    /// back per page.
    fn label(&self, pages: &[&Pending], options: &Options) -> Result<Vec<LabeledDocument>> {
        if pages.is_empty() {
            return Ok(Vec::new());
        }
        let input = self.write_table(pages.iter().map(|p| &p.analysis.rows))?;
        let output = NamedTempFile::new().map_err(|e| Error::io("creating labeler output file", e))?;
        self.labeler.label(input.path(), output.path())?;

        let file = File::open(output.path()).map_err(|e| Error::io("opening labeler output", e))?;
        let text_column = self.schema.column(Feature::Text).unwrap_or(0);
        let threshold = options.score_threshold.unwrap_or(self.config.score_threshold);
        let documents = read_labeled(BufReader::new(file), text_column, threshold)?;

        if documents.len() != pages.len() {
            return Err(Error::format(format!(
                "labeler output holds {} documents, {} were sent",
                documents.len(),
                pages.len()
            )));
        }
        info!(documents = documents.len(), "pages labeled");
        Ok(documents)
    }

    fn write_table<'r>(&self, tables: impl IntoIterator<Item = &'r Vec<Row>>) -> Result<NamedTempFile> {
        let file = NamedTempFile::new().map_err(|e| Error::io("creating feature table", e))?;
        let mut writer = TableWriter::new(BufWriter::new(file.as_file()), self.schema);
        for rows in tables {
            writer.write_rows(rows)?;
        }
        debug!(path = %file.path().display(), lines = writer.lines(), "feature table written");
        writer.finish()?;
        Ok(file)
    }

    /// Train a labeler model from annotated pages.
    pub fn train(&self, train: &[Page<'_>], dev: &[Page<'_>], model: &Path) -> Result<()> {
        let train_table = self.write_table(&self.training_rows(train)?)?;
        let dev_table = self.write_table(&self.training_rows(dev)?)?;

        let mut templates = NamedTempFile::new().map_err(|e| Error::io("creating template file", e))?;
        templates
            .write_all(render_templates(&self.schema).as_bytes())
            .and_then(|()| templates.flush())
            .map_err(|e| Error::io("writing template file", e))?;

        info!(train = train.len(), dev = dev.len(), model = %model.display(), "training labeler");
        self.labeler.train(train_table.path(), dev_table.path(), templates.path(), model)
    }

    fn training_rows(&self, pages: &[Page<'_>]) -> Result<Vec<Vec<Row>>> {
        let mut tables = Vec::with_capacity(pages.len());
        for page in pages {
            tables.push(self.extractor_for(&page.context)?.analyze(page.bytes, &page.name, Mode::Train)?.rows);
        }
        Ok(tables)
    }
}
