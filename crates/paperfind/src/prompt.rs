/// Constrains the model to answer with nothing but tool calls. The extractor
/// still tolerates commentary around the call; models do not always obey.
pub const SYSTEM_PROMPT: &str = "You MUST respond ONLY by calling the function 'paper_search_tool'. \
Never explain. Never write natural language sentences. \
Always output exactly this format:\n\n\
paper_search_tool(topic='AI', comparator='before', year=2020, min_citations=100)\n\n\
Replace values based on the user's request. \
'comparator' must be one of before, after, in. \
Omit 'topic' to search every topic and 'min_citations' when the user gives no citation floor.";
