use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn location_response(description: &str) -> Value {
    json!({
        "description": description,
        "headers": {
            "Location": {
                "description": "Path of the book",
                "schema": { "type": "string" }
            }
        }
    })
}

fn book_id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn query_parameter(name: &str, schema: Value, description: &str) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": schema
    })
}

fn book_fields(description_suffix: &str) -> Value {
    json!({
        "title": { "type": "string", "description": format!("Title of the book{description_suffix}") },
        "author": { "type": "string", "description": format!("Author of the book{description_suffix}") },
        "isbn": { "type": "string", "description": format!("ISBN of the book{description_suffix}") }
    })
}

/// OpenAPI fragment for the book module, paths relative to its mount point.
pub fn document() -> Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        query_parameter("author", json!({ "type": "string" }), "Author substring filter"),
                        query_parameter("page", json!({ "type": "integer", "default": 0 }), "0-based page number"),
                        query_parameter("size", json!({ "type": "integer", "default": 10 }), "Page size"),
                        query_parameter("sort", json!({ "type": "string", "default": "bookId,asc" }), "property[,asc|desc]")
                    ],
                    "responses": {
                        "200": {
                            "description": "Page of books",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPage" }
                                }
                            }
                        },
                        "400": error_response("Invalid paging parameters"),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBookRequest" }
                            }
                        }
                    },
                    "responses": {
                        "201": location_response("Book created"),
                        "400": {
                            "description": "Blank or missing fields",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ValidationErrorResponse" }
                                }
                            }
                        },
                        "409": error_response("Title or isbn already used"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [book_id_parameter()],
                    "responses": {
                        "200": {
                            "description": "The book",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookView" }
                                }
                            }
                        },
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Update a book; blank fields are left unchanged",
                    "tags": ["Books"],
                    "parameters": [book_id_parameter()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/UpdateBookRequest" }
                            }
                        }
                    },
                    "responses": {
                        "200": location_response("Book updated"),
                        "404": error_response("Book not found"),
                        "409": error_response("Title or isbn already used")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [book_id_parameter()],
                    "responses": {
                        "204": { "description": "Book deleted" },
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "BookView": {
                    "type": "object",
                    "properties": {
                        "bookId": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string" }
                    },
                    "required": ["bookId", "title", "author", "isbn"]
                },
                "CreateBookRequest": {
                    "type": "object",
                    "properties": book_fields(""),
                    "required": ["title", "author", "isbn"]
                },
                "UpdateBookRequest": {
                    "type": "object",
                    "properties": book_fields(", ignored when blank")
                },
                "BookPage": {
                    "type": "object",
                    "properties": {
                        "content": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/BookView" }
                        },
                        "pageable": {
                            "type": "object",
                            "properties": {
                                "pageNumber": { "type": "integer" },
                                "pageSize": { "type": "integer" },
                                "offset": { "type": "integer" }
                            }
                        },
                        "totalElements": { "type": "integer" },
                        "totalPages": { "type": "integer" },
                        "first": { "type": "boolean" },
                        "last": { "type": "boolean" },
                        "size": { "type": "integer" },
                        "number": { "type": "integer" },
                        "numberOfElements": { "type": "integer" },
                        "empty": { "type": "boolean" }
                    }
                }
            }
        }
    })
}
