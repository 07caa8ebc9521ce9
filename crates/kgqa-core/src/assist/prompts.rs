//! Prompt templates for LLM-assisted graph querying

use serde::Serialize;

/// A (source, relation, target) fact read back from the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triple {
    pub entity_1: String,
    pub relation: String,
    pub entity_2: String,
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "- 实体 1：{}\n- 实体 2：{}\n- 关系：{}",
            self.entity_1, self.entity_2, self.relation
        )
    }
}

struct QueryExample {
    question: &'static str,
    entity: &'static str,
}

const QUERY_EXAMPLES: &[QueryExample] = &[
    QueryExample {
        question: "人工智能的可解释性有哪些方法？",
        entity: "人工智能的可解释性",
    },
    QueryExample {
        question: "人工智能伦理的定义是什么？",
        entity: "人工智能伦理",
    },
    QueryExample {
        question: "隐私保护技术有哪些相关节点和关系？",
        entity: "隐私保护技术",
    },
];

/// Cypher that walks every downward path from `entity` and returns triples
pub fn example_query(entity: &str, relation_types: &[String]) -> String {
    let pattern = if relation_types.is_empty() {
        String::new()
    } else {
        format!(":{}", relation_types.join("|"))
    };
    format!(
        "MATCH path = (a {{name: \"{entity}\"}})-[{pattern}*]->(b) \
         UNWIND relationships(path) AS r \
         RETURN DISTINCT startNode(r).name AS entity_1, type(r) AS relation, endNode(r).name AS entity_2"
    )
}

/// Few-shot prompt asking the model for a single Cypher statement
pub fn query_generation_prompt(
    question: &str,
    entity_types: &[String],
    relation_types: &[String],
) -> String {
    let examples = QUERY_EXAMPLES
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            format!(
                "### 示例 {}\n输入问题：{}\n目标实体：{}\n查询语句：\n{}",
                i + 1,
                ex.question,
                ex.entity,
                example_query(ex.entity, relation_types)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "你是知识图谱查询助手，负责从问题中找出目标实体并写出 Cypher 查询。\n\n\
         ### 图谱结构\n\
         实体类型：{entities}\n\
         关系类型：{relations}\n\
         图谱是有向图，关系只从上级知识点指向下级知识点。\n\
         查询必须返回三列：entity_1、relation、entity_2。\n\n\
         {examples}\n\n\
         ### 任务\n\
         只输出一条查询语句，不要解释。\n\n\
         输入问题：{question}\n",
        entities = entity_types.join(", "),
        relations = relation_types.join(", "),
    )
}

/// Prompt asking the model to describe a set of triples in prose
pub fn description_prompt(triples: &[Triple]) -> String {
    let facts = triples
        .iter()
        .map(Triple::to_string)
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "你是知识图谱解读助手，根据实体和关系写一段连贯的说明文字。\n\n\
         ### 背景\n\
         实体是知识点，关系是连接两个知识点的有向边，例如“定义”、“包括”、“有”。\n\n\
         ### 示例\n\
         输入：\n- 实体 1：隐私保护技术\n- 实体 2：差分隐私\n- 关系：包括\n\
         输出：隐私保护技术包括差分隐私，它通过向数据加入噪声来保护个人信息。\n\n\
         ### 任务\n\
         输入：\n{facts}\n\n\
         输出：\n"
    )
}
