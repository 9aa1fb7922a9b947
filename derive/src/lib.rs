use proc_macro::TokenStream;
use proc_macro2::{Literal, Span};
use quote::quote;
use syn::{
    parse_macro_input, punctuated::Punctuated, Attribute, Data, DataStruct, DeriveInput, Fields,
    LitStr, Meta,
};

/// 生成 `Record` trait 和 `sqlx::FromRow` 的实现
///
/// - `#[record(table = "...")]`：必填，声明对应的数据表
/// - `#[record(pk = "...")]`：可选，主键字段名，默认 `id`
/// - `#[column("...")]`：字段对应的列名；只写 `#[column]` 时列名等于字段名
///
/// 没有 `#[column]` 的字段不参与任何 SQL，查询时用 `Default::default()` 填充。
/// 列的顺序就是字段的声明顺序，查询结果也按这个顺序逐列解码。
///
/// 使用示例：
/// ```ignore
/// #[derive(Debug, Default, Record)]
/// #[record(table = "test_table")]
/// struct TestUser {
///     #[column("id")]
///     id: i64,
///     #[column("first_name")]
///     first: String,
///     #[column("last_name")]
///     last: Option<String>,
/// }
/// ```
///
/// 缺少表名、主键字段不存在或没有列标记、列名重复等都会在编译期报错。
#[proc_macro_derive(Record, attributes(record, column))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// 一个带 `#[column]` 的字段
struct ColumnField<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    column: String,
}

fn expand_record(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record derive does not support generic structs",
        ));
    }

    let (table, pk) = parse_record_attrs(input)?;

    // 获取字段列表（必须是具名字段的结构体）
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Record derive only supports structs with named fields",
            ));
        }
    };

    let mut columns: Vec<ColumnField> = Vec::new();
    let mut untagged: Vec<&syn::Ident> = Vec::new();

    for field in fields {
        // 具名字段一定有 ident
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        match parse_column_attr(ident, &field.attrs)? {
            Some(column) => {
                if let Some(prev) = columns.iter().find(|c| c.column == column) {
                    return Err(syn::Error::new_spanned(
                        ident,
                        format!("column `{}` is already used by field `{}`", column, prev.ident),
                    ));
                }
                columns.push(ColumnField {
                    ident,
                    ty: &field.ty,
                    column,
                });
            }
            None => untagged.push(ident),
        }
    }

    // 编译期确保主键字段存在且带列标记
    let pk_field = match columns.iter().find(|c| c.ident == pk.as_str()) {
        Some(field) => field,
        None => {
            let msg = if untagged.iter().any(|ident| *ident == pk.as_str()) {
                format!("primary key field `{}` needs a #[column] attribute", pk)
            } else {
                format!("primary key field `{}` not found in struct", pk)
            };
            return Err(syn::Error::new_spanned(name, msg));
        }
    };
    let pk_ident = pk_field.ident;

    let field_names: Vec<LitStr> = columns
        .iter()
        .map(|c| LitStr::new(&c.ident.to_string(), Span::call_site()))
        .collect();
    let column_names: Vec<LitStr> = columns
        .iter()
        .map(|c| LitStr::new(&c.column, Span::call_site()))
        .collect();
    let column_idents: Vec<&syn::Ident> = columns.iter().map(|c| c.ident).collect();
    let column_types: Vec<&syn::Type> = columns.iter().map(|c| c.ty).collect();
    let indices: Vec<Literal> = (0..columns.len()).map(Literal::usize_suffixed).collect();

    let expanded = quote! {
        impl ::sqlxrecord::Record for #name {
            const TABLE: &'static str = #table;
            const PK: &'static str = #pk;
            const FIELDS: &'static [::sqlxrecord::FieldMeta] = &[
                #(
                    ::sqlxrecord::FieldMeta {
                        name: #field_names,
                        column: #column_names,
                    },
                )*
            ];

            fn values(&self) -> ::std::vec::Vec<::sqlxrecord::BindValue> {
                ::std::vec![
                    #(
                        ::sqlxrecord::BindValue::from(
                            ::std::clone::Clone::clone(&self.#column_idents)
                        ),
                    )*
                ]
            }

            fn pk_value(&self) -> ::sqlxrecord::BindValue {
                ::sqlxrecord::BindValue::from(::std::clone::Clone::clone(&self.#pk_ident))
            }
        }

        // 按声明顺序逐列解码，未标记的字段取默认值
        impl<'r, R> ::sqlxrecord::sqlx::FromRow<'r, R> for #name
        where
            R: ::sqlxrecord::sqlx::Row,
            usize: ::sqlxrecord::sqlx::ColumnIndex<R>,
            #(
                #column_types: ::sqlxrecord::sqlx::Decode<'r, <R as ::sqlxrecord::sqlx::Row>::Database>
                    + ::sqlxrecord::sqlx::Type<<R as ::sqlxrecord::sqlx::Row>::Database>,
            )*
        {
            fn from_row(row: &'r R) -> ::std::result::Result<Self, ::sqlxrecord::sqlx::Error> {
                ::std::result::Result::Ok(Self {
                    #(
                        #column_idents: ::sqlxrecord::sqlx::Row::try_get(row, #indices)?,
                    )*
                    #(
                        #untagged: ::std::default::Default::default(),
                    )*
                })
            }
        }
    };

    Ok(expanded)
}

/// 解析 `#[record(table = "...", pk = "...")]`
fn parse_record_attrs(input: &DeriveInput) -> syn::Result<(String, String)> {
    let mut table_name: Option<String> = None;
    let mut pk_field: Option<String> = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        let metas = attr.parse_args_with(Punctuated::<Meta, syn::Token![,]>::parse_terminated)?;
        for meta in metas {
            let Meta::NameValue(nv) = &meta else {
                return Err(syn::Error::new_spanned(
                    meta,
                    "expected `table = \"...\"` or `pk = \"...\"`",
                ));
            };
            let value = lit_str(&nv.value).ok_or_else(|| {
                syn::Error::new_spanned(&nv.value, "expected a string literal")
            })?;
            if nv.path.is_ident("table") {
                table_name = Some(value.value());
            } else if nv.path.is_ident("pk") {
                pk_field = Some(value.value());
            } else {
                return Err(syn::Error::new_spanned(
                    &nv.path,
                    "unknown record attribute, expected `table` or `pk`",
                ));
            }
        }
    }

    let table = match table_name {
        Some(table) if is_safe_identifier(&table) => table,
        Some(table) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                format!("table name `{}` must be a plain SQL identifier", table),
            ));
        }
        None => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "missing #[record(table = \"...\")] on struct definition",
            ));
        }
    };

    // 如果没有指定主键，默认使用 "id"
    let pk = pk_field.unwrap_or_else(|| "id".to_string());

    Ok((table, pk))
}

/// 解析字段上的 `#[column]`，返回列名；没有该属性时返回 `None`
///
/// 支持 `#[column]`、`#[column("name")]`、`#[column(name = "name")]`、`#[column = "name"]`。
fn parse_column_attr(ident: &syn::Ident, attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("column")) else {
        return Ok(None);
    };

    let column = match &attr.meta {
        Meta::Path(_) => ident.to_string(),
        Meta::NameValue(nv) => lit_str(&nv.value)
            .ok_or_else(|| syn::Error::new_spanned(&nv.value, "expected a string literal"))?
            .value(),
        Meta::List(list) => {
            if let Ok(lit) = list.parse_args::<LitStr>() {
                lit.value()
            } else {
                let metas =
                    list.parse_args_with(Punctuated::<Meta, syn::Token![,]>::parse_terminated)?;
                let mut column = None;
                for meta in metas {
                    match &meta {
                        Meta::NameValue(nv) if nv.path.is_ident("name") => {
                            column = lit_str(&nv.value).map(|s| s.value());
                        }
                        _ => {
                            return Err(syn::Error::new_spanned(
                                meta,
                                "expected #[column(\"...\")] or #[column(name = \"...\")]",
                            ));
                        }
                    }
                }
                column.ok_or_else(|| {
                    syn::Error::new_spanned(list, "expected a string literal column name")
                })?
            }
        }
    };

    if !is_safe_identifier(&column) {
        return Err(syn::Error::new_spanned(
            attr,
            format!("column name `{}` must be a plain SQL identifier", column),
        ));
    }

    Ok(Some(column))
}

fn lit_str(expr: &syn::Expr) -> Option<&LitStr> {
    if let syn::Expr::Lit(syn::ExprLit {
        lit: syn::Lit::Str(s),
        ..
    }) = expr
    {
        Some(s)
    } else {
        None
    }
}

fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}
