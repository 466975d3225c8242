//! # Built-in SQL Generation Prompts
//!
//! The default prompt template, the backend system instruction, the
//! business-metric definitions and the sentinel sentences used when context
//! is missing. The template can be replaced through configuration, but any
//! replacement must keep all five slots.

// --- Template Slots ---

pub const SLOT_DB_TYPE: &str = "DB_TYPE";
pub const SLOT_SCHEMA_TEXT: &str = "SCHEMA_TEXT";
pub const SLOT_METRICS_TEXT: &str = "METRICS_TEXT";
pub const SLOT_GOLD_SQL_EXAMPLES: &str = "GOLD_SQL_EXAMPLES";
pub const SLOT_USER_INPUT: &str = "USER_INPUT";

/// Every slot a template must contain, in the order they appear in the built-in template.
pub const REQUIRED_SLOTS: [&str; 5] = [
    SLOT_DB_TYPE,
    SLOT_SCHEMA_TEXT,
    SLOT_METRICS_TEXT,
    SLOT_GOLD_SQL_EXAMPLES,
    SLOT_USER_INPUT,
];

// --- Sentinels ---

/// Substituted for the schema section when no active schema document exists.
pub const SCHEMA_NOT_CONFIGURED: &str = "（DB定義書が未設定です）";

/// Substituted for the example section when no reference query is available.
pub const NO_MATCHING_EXAMPLES: &str = "（該当するゴールドSQLはありません）";

// --- Prompts ---

/// The fixed system instruction sent with every generation call.
pub const SQL_GENERATION_SYSTEM_PROMPT: &str =
    "あなたはSQLジェネレーターです。出力はSQLのみです。説明文やMarkdownは一切含めないでください。";

/// Business-metric definitions used when the caller supplies none.
pub const DEFAULT_METRICS_TEXT: &str = r#"■ LTV（デフォルト定義）
・LTV = SUM(支払金額 - COALESCE(返金額, 0))
・対象: 支払いステータスが paid のみ
・基準日: 支払日（paid_at）
・通貨: JPY

■ 登録日
・登録日 = users.created_at

■ 年齢
・現在年齢を使用
・DB種別ごとに正しい関数を使う（MySQL / BigQuery / Postgres）"#;

/// The built-in generation template.
///
/// Placeholders: `{DB_TYPE}`, `{SCHEMA_TEXT}`, `{METRICS_TEXT}`,
/// `{GOLD_SQL_EXAMPLES}`, `{USER_INPUT}`
pub const SQL_GENERATION_PROMPT: &str = r#"あなたは当社専用のデータ分析AIです。
ユーザーの日本語の質問を、Metabaseに貼り付けてそのまま実行できるSQLに変換してください。

【絶対ルール】
・出力はSQLのみ（説明文・Markdown禁止）
・SELECTのみ生成すること
・INSERT / UPDATE / DELETE / MERGE / DROP / ALTER / TRUNCATE / CREATE は禁止
・提供されたDB定義書に存在しないテーブル/カラムを捏造しない
・日付は日本時間（JST）で解釈する
・1クエリで完結（WITH句は使用可）
・可読性の高いSQLを書く（明確なJOIN条件・エイリアス）

【利用DB】
{DB_TYPE}

【DB定義書】
{SCHEMA_TEXT}

【指標定義・業務ルール】
{METRICS_TEXT}

【曖昧性解消ルール】
・「LTV教えて」とだけ言われた場合は「平均LTV」と「対象ユーザー数」を返す
・合計/平均の指定がなければ平均を採用する
・「今日まで」= CURRENT_DATE()（JST）まで
・「登録日が2026年」= 登録日時が [2026-01-01, 2027-01-01)
・「25歳」= 現在年齢が25歳
・期間指定がない場合は生涯（期間制限なし）

【ゴールドSQL（最優先で踏襲）】
以下は人間が正しいと判断したSQLです。
質問が近い場合は構造（JOIN / WHERE / 集計）を最大限踏襲し、差分のみ変更してください。
{GOLD_SQL_EXAMPLES}

【出力カラム名】
・ユーザーが日本語で質問しているため、日本語カラム名を使用する

【ユーザーの質問】
{USER_INPUT}"#;
