// uranai_core/src/generator/templates.rs

//! Prompt templates, one per fortune category.
//!
//! The table is enum-keyed: every `FortuneType` variant resolves through the
//! same `match`, so a category without a template is unrepresentable once
//! `validate()` has passed at startup. Placeholders are substituted verbatim;
//! the customer text is never interpreted.

use crate::error::{UranaiError, UranaiResult};
use crate::model::{Customer, FortuneType};

pub const NAME_PLACEHOLDER: &str = "[NAME]";
pub const BIRTHDATE_PLACEHOLDER: &str = "[BIRTHDATE]";
pub const CONSULTATION_PLACEHOLDER: &str = "[CONSULTATION]";

#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
  /// Short reading title, also used in stubbed content and email subjects.
  pub title: &'static str,
  pub content: &'static str,
}

const GENERAL: PromptTemplate = PromptTemplate {
  title: "総合運",
  content: "\
あなたは熟練の占い師です。以下の相談者について、総合運の鑑定文を書いてください。
結果は具体的で前向きな内容にしてください。

相談者情報:
- お名前: [NAME]
- 生年月日: [BIRTHDATE]
- ご相談内容: [CONSULTATION]

以下の項目について、それぞれ100〜150文字程度で占ってください:
1. 全体運：現在の全体的な運勢
2. 仕事運：仕事やキャリアに関する運勢
3. 金運：財政や金銭面の運勢
4. 恋愛運：恋愛や人間関係の運勢
5. 健康運：健康状態や体調に関する運勢

最後に、相談者へのアドバイスを200文字程度で書いてください。
結果は日本語で、敬語を使って書いてください。",
};

const CAREER: PromptTemplate = PromptTemplate {
  title: "仕事運",
  content: "\
あなたは熟練の占い師です。以下の相談者について、仕事運・キャリアの鑑定文を書いてください。
結果は具体的で前向きな内容にしてください。

相談者情報:
- お名前: [NAME]
- 生年月日: [BIRTHDATE]
- ご相談内容: [CONSULTATION]

以下の項目について、それぞれ150文字程度で占ってください:
1. 仕事運：現在の仕事運の流れ
2. 転機：キャリアの転機とその時期
3. 人間関係：職場の人間関係で気を付けること

最後に、今後のキャリアについてのアドバイスを200文字程度で書いてください。
結果は日本語で、敬語を使って書いてください。",
};

const LOVE: PromptTemplate = PromptTemplate {
  title: "恋愛運",
  content: "\
あなたは熟練の占い師です。以下の相談者について、恋愛運の鑑定文を書いてください。
結果は具体的で前向きな内容にしてください。

相談者情報:
- お名前: [NAME]
- 生年月日: [BIRTHDATE]
- ご相談内容: [CONSULTATION]

以下の項目について、それぞれ150文字程度で占ってください:
1. 恋愛運：現在の恋愛運の流れ
2. 出会い：良い出会いの時期と場所
3. 相性：相性の良い相手の特徴

最後に、恋愛についてのアドバイスを200文字程度で書いてください。
結果は日本語で、敬語を使って書いてください。",
};

const MONEY: PromptTemplate = PromptTemplate {
  title: "金運",
  content: "\
あなたは熟練の占い師です。以下の相談者について、金運の鑑定文を書いてください。
結果は具体的で前向きな内容にしてください。

相談者情報:
- お名前: [NAME]
- 生年月日: [BIRTHDATE]
- ご相談内容: [CONSULTATION]

以下の項目について、それぞれ150文字程度で占ってください:
1. 金運：現在の金運の流れ
2. 収入：収入アップのチャンスと時期
3. 注意点：金銭面で気を付けること

最後に、お金とのつき合い方についてのアドバイスを200文字程度で書いてください。
結果は日本語で、敬語を使って書いてください。",
};

const HEALTH: PromptTemplate = PromptTemplate {
  title: "健康運",
  content: "\
あなたは熟練の占い師です。以下の相談者について、健康運の鑑定文を書いてください。
結果は具体的で前向きな内容にしてください。

相談者情報:
- お名前: [NAME]
- 生年月日: [BIRTHDATE]
- ご相談内容: [CONSULTATION]

以下の項目について、それぞれ150文字程度で占ってください:
1. 健康運：現在の健康運の流れ
2. 体調：体調面で気を付けたい時期
3. 養生：おすすめのセルフケア

最後に、健康についてのアドバイスを200文字程度で書いてください。
結果は日本語で、敬語を使って書いてください。",
};

pub fn for_type(fortune_type: FortuneType) -> &'static PromptTemplate {
  match fortune_type {
    FortuneType::General => &GENERAL,
    FortuneType::Career => &CAREER,
    FortuneType::Love => &LOVE,
    FortuneType::Money => &MONEY,
    FortuneType::Health => &HEALTH,
  }
}

/// Startup check: every category must resolve to a usable template. Run once
/// before serving traffic so a broken table fails fast instead of at the
/// first paid order.
pub fn validate() -> UranaiResult<()> {
  for fortune_type in FortuneType::ALL {
    let template = for_type(fortune_type);
    let usable = !template.title.is_empty()
      && template.content.contains(NAME_PLACEHOLDER)
      && template.content.contains(BIRTHDATE_PLACEHOLDER)
      && template.content.contains(CONSULTATION_PLACEHOLDER);
    if !usable {
      return Err(UranaiError::TemplateNotFound { fortune_type });
    }
  }
  Ok(())
}

/// Substitutes the customer's data into the template.
pub fn fill(template: &PromptTemplate, customer: &Customer) -> String {
  template
    .content
    .replace(NAME_PLACEHOLDER, &customer.name)
    .replace(BIRTHDATE_PLACEHOLDER, &customer.birth_date)
    .replace(CONSULTATION_PLACEHOLDER, &customer.consultation_text)
}
