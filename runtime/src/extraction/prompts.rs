//! Prompt text for the classification service.

use crate::taxonomy::Taxonomy;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a UK retail data extraction specialist. \
Extract tenant names and classify them with the LDC taxonomy. Be thorough and extract every \
single store. Return only valid JSON.";

pub const CLASSIFICATION_SYSTEM_PROMPT: &str = "You are a UK retail data specialist. Classify \
store names into LDC taxonomy categories. Only include actual retail tenants, restaurants, or \
service providers. Return valid JSON only.";

const ANCHOR_RULE: &str = "Set isAnchorTenant=true for department stores, large fashion \
retailers (Primark, H&M, Zara, Next, M&S), cinemas, and major supermarkets";

const OUTPUT_FORMAT: &str = r#"Return a JSON array ONLY (no markdown, no explanation):
[{"name": "Store Name", "category": "T2 Category", "subcategory": "T3 Subcategory", "isAnchorTenant": false}]"#;

/// Joint extraction + classification prompt over a page's visible text.
pub fn extraction_prompt(location_name: &str, page_text: &str, taxonomy: &Taxonomy) -> String {
    format!(
        "You are extracting store/tenant data from a UK shopping centre directory page.

LOCATION: {location_name}

PAGE TEXT:
{page_text}

TASK: Extract ALL stores, restaurants, cafes, services, and leisure venues listed on this page.
For each tenant, classify using the LDC 3-Tier Retail Taxonomy below.

{listing}

RULES:
1. \"category\" MUST be an exact T2 category name from the list above
2. \"subcategory\" MUST be an exact T3 subcategory name from the list above
3. {ANCHOR_RULE}
4. Do NOT include generic entries like \"See all stores\" or \"Filter by\"
5. Do NOT include categories/sections as tenants (e.g. \"Fashion\", \"Food & Drink\")
6. If a store doesn't clearly fit a subcategory, use the most appropriate one

{OUTPUT_FORMAT}

If you cannot find any stores on this page, return an empty array: []",
        listing = taxonomy.prompt_listing(),
    )
}

/// Classification-only prompt over a list of candidate names.
pub fn classification_prompt(location_name: &str, names: &[String], taxonomy: &Taxonomy) -> String {
    format!(
        "You are categorising UK retail tenants for: {location_name}

Here are tenant names extracted from the shopping centre's sitemap URLs:

{name_list}

Classify each using the LDC 3-Tier Retail Taxonomy:

{listing}

RULES:
1. \"category\" MUST be an exact T2 category name from the list above
2. \"subcategory\" MUST be an exact T3 subcategory name from the list above
3. {ANCHOR_RULE}
4. Skip entries that are clearly NOT stores (e.g. \"Blog\", \"About Us\", \"Contact\", \"Car Park\", \"Events\", \"Jobs\")

{OUTPUT_FORMAT}",
        name_list = names.join("\n"),
        listing = taxonomy.prompt_listing(),
    )
}
